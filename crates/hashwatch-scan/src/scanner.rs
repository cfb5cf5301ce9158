//! Snapshot builder: walks include roots and hashes every kept file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use hashwatch_core::{
    FileHash, HashAlgorithm, PathFilter, ScanError, ScanOutcome, ScanStats, Snapshot, WatchConfig,
};

use crate::walker::{DirectoryWalker, EntryKind, JwalkWalker};

/// Produces the current-state snapshot for a config.
pub struct Snapshotter<W = JwalkWalker> {
    walker: W,
}

impl Snapshotter<JwalkWalker> {
    /// Create a snapshotter using the jwalk walker.
    pub fn new() -> Self {
        Self {
            walker: JwalkWalker::new(),
        }
    }

    /// Create a snapshotter whose walker honours the config's thread count.
    pub fn for_config(config: &WatchConfig) -> Self {
        Self {
            walker: JwalkWalker::with_threads(config.threads),
        }
    }
}

impl Default for Snapshotter<JwalkWalker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: DirectoryWalker> Snapshotter<W> {
    /// Create a snapshotter with a custom directory walker.
    pub fn with_walker(walker: W) -> Self {
        Self { walker }
    }

    /// Walk every include root and hash the files that are not excluded.
    pub fn scan(&self, config: &WatchConfig) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let filter = config.path_filter();
        let mut stats = ScanStats::new();

        let mut to_hash = BTreeSet::new();
        for root in &config.include_paths {
            let root = std::path::absolute(root).map_err(|e| ScanError::io(root, e))?;
            self.collect_root(&root, &filter, config.follow_symlinks, &mut stats, &mut to_hash)?;
        }

        let hashed = hash_files(&to_hash, config.hash_algorithm, config.threads)?;

        let mut snapshot = Snapshot::new();
        for (path, hash, bytes) in hashed {
            stats.record_file(bytes);
            snapshot.insert(path, hash);
        }

        Ok(ScanOutcome {
            snapshot,
            stats,
            duration: start.elapsed(),
        })
    }

    /// Classify the entries below one root.
    fn collect_root(
        &self,
        root: &Path,
        filter: &PathFilter,
        follow_symlinks: bool,
        stats: &mut ScanStats,
        to_hash: &mut BTreeSet<PathBuf>,
    ) -> Result<(), ScanError> {
        tracing::debug!(root = %root.display(), "walking include path");

        for entry in self.walker.walk(root, filter, follow_symlinks)? {
            // Checked on every entry in case the walker does not prune.
            if filter.is_excluded(&entry.path) {
                stats.paths_excluded += 1;
                tracing::debug!("Directory skipped: {}", entry.path.display());
                continue;
            }

            match entry.kind {
                EntryKind::Directory => stats.dirs_visited += 1,
                EntryKind::File => {
                    if filter.is_extension_excluded(&entry.path) {
                        stats.files_skipped += 1;
                        tracing::debug!("File skipped: {}", entry.path.display());
                    } else {
                        to_hash.insert(entry.path);
                    }
                }
                // File links arrive as `File`; only directory and dangling links land here.
                EntryKind::Symlink | EntryKind::Other => {
                    stats.other_skipped += 1;
                    tracing::debug!("Not a regular file, skipped: {}", entry.path.display());
                }
            }
        }

        Ok(())
    }
}

/// Hash files in parallel. Any unreadable file fails the whole batch.
fn hash_files(
    paths: &BTreeSet<PathBuf>,
    algorithm: HashAlgorithm,
    threads: usize,
) -> Result<Vec<(PathBuf, FileHash, u64)>, ScanError> {
    let work = || {
        paths
            .par_iter()
            .map(|path| {
                let (hash, bytes) = algorithm
                    .digest_file(path)
                    .map_err(|e| ScanError::io(path, e))?;
                tracing::debug!("Found file {} with {}: {}", path.display(), algorithm, hash);
                Ok((path.clone(), hash, bytes))
            })
            .collect::<Result<Vec<_>, ScanError>>()
    };

    match threads {
        0 => work(),
        n => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| ScanError::ThreadPool {
                message: e.to_string(),
            })?
            .install(work),
    }
}
