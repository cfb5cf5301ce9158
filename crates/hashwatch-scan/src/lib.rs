//! Snapshot engine for hashwatch.
//!
//! This crate walks the configured include paths and builds a
//! [`Snapshot`] mapping every kept file to its content hash.
//!
//! # Overview
//!
//! - **Pluggable traversal** via the [`DirectoryWalker`] trait; the default
//!   [`JwalkWalker`] walks in parallel and skips excluded directories
//! - **Parallel hashing** of file contents on a rayon pool
//! - **Folder and extension exclusion** through [`PathFilter`]
//!
//! # Example
//!
//! ```rust,no_run
//! use hashwatch_scan::{Snapshotter, WatchConfig};
//!
//! let config = WatchConfig::new("/var/www");
//! let outcome = Snapshotter::for_config(&config).scan(&config).unwrap();
//!
//! println!("Hashed {} files", outcome.stats.files_hashed);
//! for (path, hash) in &outcome.snapshot {
//!     println!("{}={}", path.display(), hash);
//! }
//! ```

mod scanner;
mod walker;

pub use scanner::Snapshotter;
pub use walker::{DirectoryWalker, EntryKind, JwalkWalker, WalkEntry};

// Re-export core types for convenience
pub use hashwatch_core::{
    FileHash, HashAlgorithm, PathFilter, ScanError, ScanOutcome, ScanStats, Snapshot, WatchConfig,
};
