//! Line-oriented baseline persistence.
//!
//! The baseline file holds one `absolutePath=hexHash` record per line with
//! no header. Records are split on the last `=`, which hashes never
//! contain, so paths that contain `=` survive a round trip.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use hashwatch_core::{FileHash, Snapshot};

/// Errors raised while reading or writing the baseline.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The baseline exists but could not be read.
    #[error("Failed to read baseline {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The baseline could not be written.
    #[error("Failed to write baseline {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record does not have the `path=hash` shape.
    #[error("Malformed baseline record on line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// The path cannot be stored in the line format.
    #[error("Path cannot be stored in the baseline: {path}")]
    UnsupportedPath { path: PathBuf },
}

/// Reads and writes the persisted reference snapshot.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the baseline file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a baseline file is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the baseline. A missing file yields an empty snapshot.
    pub fn load(&self) -> Result<Snapshot, BaselineError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No baseline at {}, starting empty", self.path.display());
                return Ok(Snapshot::new());
            }
            Err(source) => {
                return Err(BaselineError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot = parse(&text)?;
        tracing::debug!(
            entries = snapshot.len(),
            "Loaded baseline {}",
            self.path.display()
        );
        Ok(snapshot)
    }

    /// Replace the baseline with `snapshot`.
    ///
    /// The records are written to a temporary file next to the baseline
    /// and renamed over it, so readers never observe a partial file.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), BaselineError> {
        let content = render(snapshot)?;
        let write_err = |source: io::Error| BaselineError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(content.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::info!(
            entries = snapshot.len(),
            "Saved baseline {}",
            self.path.display()
        );
        Ok(())
    }
}

/// Parse baseline text into a snapshot.
pub fn parse(text: &str) -> Result<Snapshot, BaselineError> {
    let mut snapshot = Snapshot::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let malformed = |reason: &str| BaselineError::Malformed {
            line: line_no,
            reason: reason.to_string(),
        };

        let (path, hash) = line.rsplit_once('=').ok_or_else(|| malformed("missing '='"))?;
        if path.is_empty() {
            return Err(malformed("empty path"));
        }
        let hash = FileHash::parse(hash.trim()).ok_or_else(|| malformed("hash is not hex"))?;

        snapshot.insert(PathBuf::from(path), hash);
    }

    Ok(snapshot)
}

/// Render a snapshot as baseline text, one record per line.
pub fn render(snapshot: &Snapshot) -> Result<String, BaselineError> {
    let mut out = String::new();

    for (path, hash) in snapshot {
        let text = match path.to_str() {
            Some(t) if !t.is_empty() && !t.contains(['\n', '\r']) => t,
            _ => return Err(BaselineError::UnsupportedPath { path: path.clone() }),
        };
        out.push_str(text);
        out.push('=');
        out.push_str(hash.as_str());
        out.push('\n');
    }

    Ok(out)
}
