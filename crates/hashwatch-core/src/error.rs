//! Error types shared across hashwatch crates.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a snapshot.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory walker failed to read an entry.
    #[error("Walk error at {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Failed to set up the hashing thread pool.
    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown values.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// No config path was given and no default location exists.
    #[error("No configuration directory available on this platform")]
    NoDefaultLocation,

    /// The configuration parsed but is not usable.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Access-control failures. Raised before any filesystem access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A password is configured but none was supplied.
    #[error("A password is required to run this check")]
    Missing,

    /// The supplied password does not match the configured one.
    #[error("Wrong password")]
    Mismatch,
}
