//! Domain models and types for Sitepack.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Request model** ([`ExportRequest`], [`ExportMethod`])
//! - **Build outcome** ([`BuildOutcome`], [`FailureReason`])
//! - **Artifacts and archives** ([`ArtifactTree`], [`Archive`], [`RelativePath`])
//! - **Error types** ([`SitepackError`] and the per-stage errors)
//! - **Result type alias** ([`Result`])
//!
//! # Path Safety
//!
//! Archive entry names are [`RelativePath`] values, which cannot be absolute
//! and cannot contain `..`:
//!
//! ```rust
//! use sitepack::domain::RelativePath;
//!
//! assert!(RelativePath::new("index.html").is_ok());
//! assert!(RelativePath::new("../../etc/passwd").is_err());
//! ```

pub mod artifact;
pub mod errors;
pub mod outcome;
pub mod request;
pub mod result;

// Re-export commonly used types for convenience
pub use artifact::{
    Archive, ArchiveEntry, ArchivePayload, ArtifactEntry, ArtifactTree, RelativePath,
};
pub use errors::{ArchiveError, BuildError, ForwardError, SitepackError, VerificationError};
pub use outcome::{BuildOutcome, FailureReason};
pub use request::{ExportMethod, ExportRequest};
pub use result::Result;
