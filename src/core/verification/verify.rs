//! Output directory verification
//!
//! Runs after a successful build and before archiving. A build that exits
//! cleanly but leaves no output must not produce an empty archive.

use crate::domain::VerificationError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Facts about a verified output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOutput {
    pub path: PathBuf,
    /// Number of regular files under the directory
    pub file_count: usize,
}

/// Verifier for build output directories
///
/// Read-only: calling [`verify`](OutputVerifier::verify) repeatedly on an
/// unchanged directory gives the same answer.
pub struct OutputVerifier;

impl OutputVerifier {
    /// Check that `output_dir` exists, is a directory and holds at least one file
    ///
    /// # Errors
    ///
    /// - [`VerificationError::NotFound`] when the path does not exist
    /// - [`VerificationError::NotADirectory`] when it is a file
    /// - [`VerificationError::Empty`] when no regular file is found at any depth
    /// - [`VerificationError::Unreadable`] when the directory cannot be walked
    ///
    /// # Examples
    ///
    /// ```
    /// use sitepack::core::verification::OutputVerifier;
    /// use sitepack::domain::VerificationError;
    ///
    /// let result = OutputVerifier::verify(std::path::Path::new("/nonexistent/out"));
    /// assert!(matches!(result, Err(VerificationError::NotFound(_))));
    /// ```
    pub fn verify(output_dir: &Path) -> Result<VerifiedOutput, VerificationError> {
        let shown = output_dir.display().to_string();

        let metadata = match std::fs::metadata(output_dir) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(output_dir = %shown, "Output directory not found");
                return Err(VerificationError::NotFound(shown));
            }
            Err(e) => {
                return Err(VerificationError::Unreadable {
                    path: shown,
                    message: e.to_string(),
                })
            }
        };

        if !metadata.is_dir() {
            return Err(VerificationError::NotADirectory(shown));
        }

        let mut file_count = 0;
        for entry in WalkDir::new(output_dir).follow_links(false) {
            let entry = entry.map_err(|e| VerificationError::Unreadable {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| shown.clone()),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() {
                file_count += 1;
            }
        }

        if file_count == 0 {
            tracing::warn!(output_dir = %shown, "Output directory contains no files");
            return Err(VerificationError::Empty(shown));
        }

        tracing::debug!(output_dir = %shown, file_count, "Output directory verified");

        Ok(VerifiedOutput {
            path: output_dir.to_path_buf(),
            file_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = OutputVerifier::verify(&dir.path().join("out"));
        match result {
            Err(VerificationError::NotFound(path)) => assert!(path.ends_with("out")),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out");
        fs::write(&file, "not a dir").unwrap();

        assert!(matches!(
            OutputVerifier::verify(&file),
            Err(VerificationError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_directory_with_only_subdirectories_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("out/_next/static")).unwrap();

        assert!(matches!(
            OutputVerifier::verify(&dir.path().join("out")),
            Err(VerificationError::Empty(_))
        ));
    }

    #[test]
    fn test_counts_nested_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("reports")).unwrap();
        fs::write(out.join("index.html"), "<html></html>").unwrap();
        fs::write(out.join("reports/index.html"), "<html></html>").unwrap();

        let verified = OutputVerifier::verify(&out).unwrap();
        assert_eq!(verified.file_count, 2);
        assert_eq!(verified.path, out);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("index.html"), "hi").unwrap();

        let first = OutputVerifier::verify(&out).unwrap();
        let second = OutputVerifier::verify(&out).unwrap();
        assert_eq!(first, second);
    }
}
