//! Content hash types and digest algorithms.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use sha1::Digest;

/// Read buffer size used when streaming file contents into a hasher.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used for file hashes and the aggregate fingerprint.
///
/// SHA-1 is the default so baselines written by earlier deployments stay
/// comparable. All algorithms produce fixed-length lowercase hex.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1 (40 hex chars).
    #[default]
    Sha1,
    /// SHA-256 (64 hex chars).
    Sha256,
    /// BLAKE3 (64 hex chars).
    Blake3,
}

impl HashAlgorithm {
    /// Length of the hex digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 64,
        }
    }

    /// Hash an in-memory byte slice.
    pub fn digest(self, bytes: &[u8]) -> FileHash {
        let mut hasher = StreamHasher::new(self);
        hasher.update(bytes);
        hasher.finish()
    }

    /// Hash the full contents of a file.
    pub fn digest_file(self, path: &Path) -> io::Result<(FileHash, u64)> {
        let mut file = File::open(path)?;
        let mut hasher = StreamHasher::new(self);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut total: u64 = 0;

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok((hasher.finish(), total))
    }
}

/// Incremental hasher over any supported algorithm.
enum StreamHasher {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(bytes),
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finish(self) -> FileHash {
        let hex = match self {
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        };
        FileHash(CompactString::from(hex))
    }
}

/// Hex-encoded content hash of a single file.
///
/// Values loaded from a baseline are kept verbatim, so a `FileHash` is not
/// tied to the algorithm currently configured.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHash(CompactString);

impl FileHash {
    /// Wrap an existing hex string.
    pub fn new(hex: impl Into<CompactString>) -> Self {
        Self(hex.into())
    }

    /// Parse a hex digest, rejecting empty or non-hex input.
    pub fn parse(hex: &str) -> Option<Self> {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(CompactString::from(hex.to_ascii_lowercase())))
    }

    /// Get the hash as a hex string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Aggregate fingerprint summarising a whole diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(FileHash);

impl Fingerprint {
    /// Wrap a digest as a fingerprint.
    pub fn new(hash: FileHash) -> Self {
        Self(hash)
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Compare against a caller-supplied value, ignoring ASCII case and
    /// surrounding whitespace.
    pub fn matches(&self, expected: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(expected.trim())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_empty_digest() {
        let hash = HashAlgorithm::Sha1.digest(b"");
        assert_eq!(hash.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_hex_lengths() {
        for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
            let hash = algorithm.digest(b"hello");
            assert_eq!(hash.as_str().len(), algorithm.hex_len());
            assert!(hash.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_digest_file_matches_digest() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        let content = vec![7u8; READ_BUFFER_SIZE * 2 + 17];
        std::fs::write(&path, &content).unwrap();

        let (hash, len) = HashAlgorithm::Sha256.digest_file(&path).unwrap();
        assert_eq!(len, content.len() as u64);
        assert_eq!(hash, HashAlgorithm::Sha256.digest(&content));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_file_hash_parse() {
        assert_eq!(FileHash::parse("ABcd01").unwrap().as_str(), "abcd01");
        assert!(FileHash::parse("").is_none());
        assert!(FileHash::parse("xyz").is_none());
    }

    #[test]
    fn test_fingerprint_matches() {
        let fp = Fingerprint::new(FileHash::new("abcdef"));
        assert!(fp.matches("ABCDEF"));
        assert!(fp.matches(" abcdef\n"));
        assert!(!fp.matches("abcdee"));
    }
}
