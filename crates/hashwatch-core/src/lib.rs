//! Core types and configuration for hashwatch.
//!
//! This crate provides the data structures shared by the scanner, the
//! baseline store and the alerting pipeline: snapshots, content hashes,
//! path exclusion rules and the run configuration.

mod config;
mod error;
mod filter;
mod hash;
mod snapshot;

pub use config::{
    AlertChannel, AlertConfig, CONFIG_FILE_NAME, DEFAULT_SUBJECT, SmtpConfig, WatchConfig,
    WatchConfigBuilder,
};
pub use error::{AuthError, ConfigError, ScanError};
pub use filter::{ExclusionMode, PathFilter, normalize_extension};
pub use hash::{FileHash, Fingerprint, HashAlgorithm};
pub use snapshot::{ScanOutcome, ScanStats, Snapshot};
