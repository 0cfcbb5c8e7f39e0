//! Domain error types
//!
//! This module defines the error hierarchy for Sitepack. Every failure kind the
//! export pipeline can produce has its own variant so the HTTP layer can map it
//! to a status code and a diagnostic body. Errors don't expose third-party types.

use crate::domain::outcome::FailureReason;
use thiserror::Error;

/// Main Sitepack error type
///
/// This is the primary error type used throughout the application.
/// It wraps the per-stage error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SitepackError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Build command errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Output directory verification errors
    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    /// Archive packaging errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Downstream forwarding errors
    #[error("Forward error: {0}")]
    Forward(#[from] ForwardError),

    /// Another export currently holds the lease
    #[error("An export build is already in progress")]
    LeaseBusy,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Build command errors
///
/// Both variants carry the captured process output so that callers can
/// surface it as diagnostic text.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The build command failed (non-zero exit, reported errors, oversized output)
    #[error("{reason}")]
    Failed {
        reason: FailureReason,
        stdout: String,
        stderr: String,
    },

    /// The build command exceeded its time budget and was killed
    #[error("build timed out after {timeout_secs}s")]
    TimedOut {
        timeout_secs: u64,
        stdout: String,
        stderr: String,
    },
}

impl BuildError {
    /// Captured output for diagnostics: stderr, falling back to stdout
    pub fn output(&self) -> &str {
        let (stdout, stderr) = match self {
            BuildError::Failed { stdout, stderr, .. } => (stdout, stderr),
            BuildError::TimedOut { stdout, stderr, .. } => (stdout, stderr),
        };

        if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        }
    }

    /// Diagnostic text for error responses: the failure reason, then any output
    pub fn diagnostics(&self) -> String {
        match self.output() {
            "" => self.to_string(),
            text => format!("{self}\n{text}"),
        }
    }
}

/// Output directory verification errors
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Output directory does not exist
    #[error("output directory not found: {0}")]
    NotFound(String),

    /// Output path exists but is not a directory
    #[error("output path is not a directory: {0}")]
    NotADirectory(String),

    /// Output directory contains no regular files
    #[error("output directory is empty: {0}")]
    Empty(String),

    /// Output directory could not be inspected
    #[error("failed to inspect output directory {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Archive packaging errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading an artifact or writing the archive failed
    #[error("I/O failure at {path}: {message}")]
    Io { path: String, message: String },

    /// The zip writer rejected an entry
    #[error("zip encoding failed: {0}")]
    Zip(String),

    /// A path could not be expressed relative to the artifact root
    #[error("invalid artifact path: {0}")]
    InvalidPath(String),

    /// The blocking archive task panicked or was cancelled
    #[error("archive task failed: {0}")]
    Join(String),
}

/// Downstream forwarding errors
///
/// These errors don't expose the HTTP client types.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Downstream answered with a non-success status
    #[error("downstream returned {status}: {body}")]
    Downstream { status: u16, body: String },

    /// Downstream could not be reached
    #[error("downstream unreachable: {0}")]
    Unreachable(String),

    /// The resolved downstream address is not a valid URL
    #[error("invalid downstream target: {0}")]
    InvalidTarget(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SitepackError {
    fn from(err: std::io::Error) -> Self {
        SitepackError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SitepackError {
    fn from(err: serde_json::Error) -> Self {
        SitepackError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SitepackError {
    fn from(err: toml::de::Error) -> Self {
        SitepackError::Configuration(format!("TOML parse error: {err}"))
    }
}
