//! Directory traversal behind a replaceable trait.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};

use hashwatch_core::{PathFilter, ScanError};

/// Kind of a walked filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link to a directory, or a dangling link. Never descended.
    Symlink,
    /// Sockets, devices, fifos.
    Other,
}

/// A single entry produced by a [`DirectoryWalker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// What the entry is.
    pub kind: EntryKind,
}

impl WalkEntry {
    /// Create a new walk entry.
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Recursively enumerates everything below a root.
///
/// Implementations may skip descending into directories the filter
/// excludes, but must still report entry read failures as errors.
pub trait DirectoryWalker: Send + Sync {
    /// Walk `root`, returning the root itself and all entries below it.
    fn walk(
        &self,
        root: &Path,
        filter: &PathFilter,
        follow_symlinks: bool,
    ) -> Result<Vec<WalkEntry>, ScanError>;
}

/// Parallel walker built on jwalk.
#[derive(Debug, Clone)]
pub struct JwalkWalker {
    threads: usize,
}

impl JwalkWalker {
    /// Create a walker on the default rayon pool.
    pub fn new() -> Self {
        Self { threads: 0 }
    }

    /// Use a dedicated pool with `threads` workers (0 = default pool).
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }
}

impl Default for JwalkWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryWalker for JwalkWalker {
    fn walk(
        &self,
        root: &Path,
        filter: &PathFilter,
        follow_symlinks: bool,
    ) -> Result<Vec<WalkEntry>, ScanError> {
        // The configured root is always resolved, even when it is a link.
        let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;

        // A root that is itself excluded or not a directory yields only itself.
        if !metadata.is_dir() || filter.is_excluded(root) {
            return Ok(vec![WalkEntry::new(root, kind_of(&metadata.file_type()))]);
        }

        // A symlinked root is walked through its target; every path is still
        // reported under the configured name.
        let is_link = std::fs::symlink_metadata(root)
            .map_err(|e| ScanError::io(root, e))?
            .file_type()
            .is_symlink();
        let walk_root = if is_link {
            std::fs::canonicalize(root).map_err(|e| ScanError::io(root, e))?
        } else {
            root.to_path_buf()
        };

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let prune = filter.clone();
        let (prune_from, prune_to) = (walk_root.clone(), root.to_path_buf());
        let walker = WalkDir::new(&walk_root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(follow_symlinks)
            .sort(true)
            .min_depth(0)
            .process_read_dir(move |_depth, _path, _state, children| {
                for entry in children.iter_mut().flatten() {
                    if entry.file_type().is_dir()
                        && prune.is_excluded(&relocate(&entry.path(), &prune_from, &prune_to))
                    {
                        entry.read_children_path = None;
                    }
                }
            });

        let mut entries = Vec::new();
        for entry_result in walker {
            let entry = entry_result.map_err(|err| ScanError::Walk {
                path: err.path().map(|p| p.to_path_buf()).unwrap_or_else(|| root.to_path_buf()),
                message: err.to_string(),
            })?;

            let path = relocate(&entry.path(), &walk_root, root);
            let kind = match kind_of(&entry.file_type()) {
                EntryKind::Symlink => link_kind(&path),
                kind => kind,
            };
            entries.push(WalkEntry::new(path, kind));
        }

        Ok(entries)
    }
}

/// Re-root `path` from `from` onto `to`.
fn relocate(path: &Path, from: &Path, to: &Path) -> PathBuf {
    match path.strip_prefix(from) {
        Ok(rest) if from != to && rest.as_os_str().is_empty() => to.to_path_buf(),
        Ok(rest) if from != to => to.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Links to regular files are hashed through the link; anything else is
/// reported as a link and left alone.
fn link_kind(path: &Path) -> EntryKind {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => EntryKind::File,
        _ => EntryKind::Symlink,
    }
}

fn kind_of(file_type: &std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::Other
    }
}
