//! Snapshot container and scan statistics.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hash::FileHash;

/// Mapping from absolute file path to content hash.
///
/// Entries are kept in lexicographic path order, which is the order used
/// for serialisation and fingerprinting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<PathBuf, FileHash>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the hash for a path. Returns the previous hash.
    pub fn insert(&mut self, path: impl Into<PathBuf>, hash: FileHash) -> Option<FileHash> {
        self.entries.insert(path.into(), hash)
    }

    /// Look up the hash for a path.
    pub fn get(&self, path: &Path) -> Option<&FileHash> {
        self.entries.get(path)
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> btree_map::Iter<'_, PathBuf, FileHash> {
        self.entries.iter()
    }

    /// Iterate paths in order.
    pub fn paths(&self) -> btree_map::Keys<'_, PathBuf, FileHash> {
        self.entries.keys()
    }
}

impl FromIterator<(PathBuf, FileHash)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (PathBuf, FileHash)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(PathBuf, FileHash)> for Snapshot {
    fn extend<I: IntoIterator<Item = (PathBuf, FileHash)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl IntoIterator for Snapshot {
    type Item = (PathBuf, FileHash);
    type IntoIter = btree_map::IntoIter<PathBuf, FileHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a PathBuf, &'a FileHash);
    type IntoIter = btree_map::Iter<'a, PathBuf, FileHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Summary statistics for a snapshot scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Regular files hashed.
    pub files_hashed: u64,
    /// Files skipped by the extension rule.
    pub files_skipped: u64,
    /// Paths skipped by the folder rule.
    pub paths_excluded: u64,
    /// Directories traversed.
    pub dirs_visited: u64,
    /// Entries that are neither files nor directories (sockets, symlinks, ...).
    pub other_skipped: u64,
    /// Total bytes hashed.
    pub bytes_hashed: u64,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hashed file.
    pub fn record_file(&mut self, bytes: u64) {
        self.files_hashed += 1;
        self.bytes_hashed += bytes;
    }
}

/// A snapshot together with how it was produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The current-state snapshot.
    pub snapshot: Snapshot,
    /// Counters gathered while scanning.
    pub stats: ScanStats,
    /// Wall-clock time spent scanning and hashing.
    pub duration: Duration,
}
