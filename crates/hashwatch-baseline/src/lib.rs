//! Baseline persistence and snapshot comparison for hashwatch.
//!
//! - **Baseline store** - load and atomically replace the `path=hash`
//!   baseline file
//! - **Diff engine** - split two snapshots into added, removed and changed
//!   sets and compute a single fingerprint over the result
//!
//! ```rust,no_run
//! use hashwatch_baseline::{BaselineStore, DiffEngine};
//! use hashwatch_core::{HashAlgorithm, Snapshot};
//!
//! let store = BaselineStore::new("/var/lib/hashwatch/baseline");
//! let baseline = store.load().unwrap();
//! let current = Snapshot::new();
//!
//! let diff = DiffEngine::diff(&current, &baseline);
//! println!("{} removed", diff.removed.len());
//! println!("fingerprint {}", diff.fingerprint(HashAlgorithm::Sha1));
//! ```

mod diff;
pub mod store;

pub use diff::{DiffEngine, DiffResult};
pub use store::{BaselineError, BaselineStore};

// Re-export core types
pub use hashwatch_core::{FileHash, Fingerprint, HashAlgorithm, Snapshot};
