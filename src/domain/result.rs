//! Crate-wide `Result` alias

use super::errors::SitepackError;

/// `Result` with [`SitepackError`] as the error type
///
/// Stage-specific functions return their own error (`BuildError`,
/// `ArchiveError`, ...); `?` lifts them into this one.
///
/// ```
/// use sitepack::domain::{ArchiveError, Result};
///
/// fn pack() -> std::result::Result<(), ArchiveError> {
///     Err(ArchiveError::Zip("central directory".to_string()))
/// }
///
/// fn export() -> Result<()> {
///     pack()?;
///     Ok(())
/// }
///
/// assert!(export().is_err());
/// ```
pub type Result<T> = std::result::Result<T, SitepackError>;
