// src/error.rs

//! Crate-wide error types
//!
//! Every failure aborts the install; nothing is recovered locally.
//! The command layer wraps these with `anyhow` context for display.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Manifest failed to parse or violated a structural invariant
    #[error("manifest error: {0}")]
    ManifestError(String),

    /// Artifact source unreachable or returned a non-success status
    #[error("download failed: {0}")]
    DownloadError(String),

    /// Fetched bytes did not match the manifest digest. Never retried:
    /// a mismatch may indicate tampering, not just corruption.
    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Interpreter unavailable, wrong version, or virtualenv creation failed
    #[error("environment error: {0}")]
    EnvironmentError(String),

    /// Downstream package installation failed (pip, entry-point linking)
    #[error("install failed: {0}")]
    InstallError(String),

    #[error("not found: {0}")]
    NotFoundError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
