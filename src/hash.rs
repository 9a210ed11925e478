// src/hash.rs

//! Integrity digests for component files and archives
//!
//! Digests are written as Subresource-Integrity style tags:
//! `<algorithm>-<base64(digest)>`, e.g. `sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=`.
//!
//! | Use | Algorithm |
//! |-----|-----------|
//! | Per-file integrity in manifests | SHA-256 |
//! | Archive integrity / checksum | SHA-256 |
//! | Verifying third-party tags | SHA-256, SHA-384, SHA-512 |

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256, emitted by the packager
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Get the digest length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Get the algorithm name as used in integrity tags
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Integrity tag parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Unknown hash algorithm name
    UnknownAlgorithm(String),
    /// Tag is not of the form `<algo>-<base64>`
    MalformedTag(String),
    /// Digest is not valid base64
    InvalidBase64(String),
    /// Digest has wrong length for algorithm
    InvalidLength { expected: usize, got: usize },
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unknown hash algorithm: {}", name),
            Self::MalformedTag(tag) => write!(f, "malformed integrity tag: {}", tag),
            Self::InvalidBase64(s) => write!(f, "invalid base64 in integrity tag: {}", s),
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {} bytes, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for HashError {}

/// A digest with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Integrity {
    /// The algorithm used
    pub algorithm: HashAlgorithm,
    /// The digest, base64 encoded
    pub digest: String,
}

impl Integrity {
    /// Compute the integrity of a byte slice
    pub fn of(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let mut hasher = Hasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute the SHA-256 integrity of a byte slice
    #[inline]
    pub fn sha256(data: &[u8]) -> Self {
        Self::of(HashAlgorithm::Sha256, data)
    }

    /// Parse an integrity tag (e.g. "sha256-abc...=")
    pub fn parse(tag: &str) -> Result<Self, HashError> {
        let (algo, digest) = tag
            .split_once('-')
            .ok_or_else(|| HashError::MalformedTag(tag.to_string()))?;
        let algorithm: HashAlgorithm = algo.parse()?;

        let raw = BASE64
            .decode(digest)
            .map_err(|_| HashError::InvalidBase64(digest.to_string()))?;
        if raw.len() != algorithm.output_len() {
            return Err(HashError::InvalidLength {
                expected: algorithm.output_len(),
                got: raw.len(),
            });
        }

        Ok(Self {
            algorithm,
            digest: digest.to_string(),
        })
    }

    /// Check whether `data` hashes to this integrity value
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::of(self.algorithm, data) == *self
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm.name(), self.digest)
    }
}

impl FromStr for Integrity {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Incremental hasher for any supported algorithm
pub struct Hasher {
    state: HasherState,
}

enum HasherState {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    /// Create a new hasher with the specified algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => HasherState::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        Self { state }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(h) => h.update(data),
            HasherState::Sha384(h) => h.update(data),
            HasherState::Sha512(h) => h.update(data),
        }
    }

    /// Finalize and return the integrity value
    pub fn finalize(self) -> Integrity {
        let (algorithm, digest) = match self.state {
            HasherState::Sha256(h) => (HashAlgorithm::Sha256, BASE64.encode(h.finalize())),
            HasherState::Sha384(h) => (HashAlgorithm::Sha384, BASE64.encode(h.finalize())),
            HasherState::Sha512(h) => (HashAlgorithm::Sha512, BASE64.encode(h.finalize())),
        };
        Integrity { algorithm, digest }
    }
}

/// SHA-256 integrity tag of a byte slice (convenience function)
#[inline]
pub fn sha256_integrity(data: &[u8]) -> String {
    Integrity::sha256(data).to_string()
}

// =============================================================================
// Verification
// =============================================================================

/// Verification failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "integrity mismatch: expected {}, got {}", self.expected, self.actual)
    }
}

impl std::error::Error for VerifyError {}

/// Verify bytes against an expected integrity tag
///
/// The digest is recomputed with the tag's own algorithm. An unparsable tag
/// never verifies.
///
/// # Example
/// ```
/// use wpsyde::hash::verify_bytes;
///
/// let tag = "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
/// assert!(verify_bytes(b"", tag).is_ok());
/// assert!(verify_bytes(b"tampered", tag).is_err());
/// ```
pub fn verify_bytes(data: &[u8], expected: &str) -> Result<(), VerifyError> {
    let expected_integrity = Integrity::parse(expected).map_err(|e| VerifyError {
        expected: expected.to_string(),
        actual: format!("<{}>", e),
    })?;

    let actual = Integrity::of(expected_integrity.algorithm, data);
    if actual == expected_integrity {
        Ok(())
    } else {
        Err(VerifyError {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
