//! Three-way snapshot comparison and aggregate fingerprinting.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use hashwatch_core::{Fingerprint, HashAlgorithm, Snapshot};

/// Difference between the current snapshot and the baseline.
///
/// The three sets never share a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// In the current snapshot only, with the current hash.
    pub added: Snapshot,
    /// In the baseline only, with the baseline hash.
    pub removed: Snapshot,
    /// In both with differing hashes, with the baseline hash.
    pub changed: Snapshot,
}

impl DiffResult {
    /// Check if nothing was added, removed or changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of differing paths.
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Fingerprint of this diff under `algorithm`.
    pub fn fingerprint(&self, algorithm: HashAlgorithm) -> Fingerprint {
        DiffEngine::fingerprint(self, algorithm)
    }
}

/// Compares snapshots.
pub struct DiffEngine;

impl DiffEngine {
    /// Compare `current` against `baseline`.
    pub fn diff(current: &Snapshot, baseline: &Snapshot) -> DiffResult {
        let mut result = DiffResult::default();

        for (path, hash) in current {
            match baseline.get(path) {
                None => {
                    result.added.insert(path.clone(), hash.clone());
                }
                Some(old) if old != hash => {
                    result.changed.insert(path.clone(), old.clone());
                }
                Some(_) => {}
            }
        }

        for (path, hash) in baseline {
            if !current.contains(path) {
                result.removed.insert(path.clone(), hash.clone());
            }
        }

        result
    }

    /// Digest over the comma-joined hashes of `added`, `removed` and
    /// `changed`, in that order, each in path order.
    pub fn fingerprint(diff: &DiffResult, algorithm: HashAlgorithm) -> Fingerprint {
        let joined = diff
            .added
            .iter()
            .chain(diff.removed.iter())
            .chain(diff.changed.iter())
            .map(|(_, hash)| hash.as_str())
            .join(",");

        Fingerprint::new(algorithm.digest(joined.as_bytes()))
    }
}
