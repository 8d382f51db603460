// src/hash.rs

//! SHA-256 hashing for artifact integrity
//!
//! Every artifact named in a manifest carries a SHA-256 digest; this module
//! computes and verifies those digests. Files are streamed so verification
//! never loads a full sdist into memory.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Hex length of a SHA-256 digest (32 bytes)
pub const SHA256_HEX_LEN: usize = 64;

/// Errors from checksum parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumParseError {
    /// Digest string has the wrong length
    InvalidLength { expected: usize, got: usize },
    /// Digest string contains non-hex characters
    InvalidHex(String),
}

impl fmt::Display for ChecksumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in digest: {}", s),
        }
    }
}

impl std::error::Error for ChecksumParseError {}

/// A validated SHA-256 digest in lowercase hex form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Validate and normalize a hex digest string
    pub fn parse(s: &str) -> Result<Self, ChecksumParseError> {
        if s.len() != SHA256_HEX_LEN {
            return Err(ChecksumParseError::InvalidLength {
                expected: SHA256_HEX_LEN,
                got: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChecksumParseError::InvalidHex(s.to_string()));
        }
        Ok(Self(s.to_lowercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = ChecksumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compute the SHA-256 hex digest of a byte slice
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 hex digest of data from a reader
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 hex digest of a file, streaming its content
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

/// Digest mismatch details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sha256 mismatch: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for VerifyError {}

/// Verify bytes match an expected SHA-256 digest (case-insensitive)
pub fn verify_bytes(data: &[u8], expected: &str) -> Result<(), VerifyError> {
    let actual = sha256_bytes(data);
    if actual == expected.to_lowercase() {
        Ok(())
    } else {
        Err(VerifyError {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Why a file failed verification: unreadable, or readable but wrong
#[derive(Debug)]
pub enum FileVerifyError {
    Io(io::Error),
    Mismatch(VerifyError),
}

impl fmt::Display for FileVerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read file: {}", e),
            Self::Mismatch(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for FileVerifyError {}

/// Verify a file matches an expected SHA-256 digest.
///
/// A file that cannot be read is an io failure, not a digest mismatch.
pub fn verify_file(path: &Path, expected: &str) -> Result<(), FileVerifyError> {
    let actual = sha256_file(path).map_err(FileVerifyError::Io)?;

    if actual == expected.to_lowercase() {
        Ok(())
    } else {
        Err(FileVerifyError::Mismatch(VerifyError {
            expected: expected.to_string(),
            actual,
        }))
    }
}
