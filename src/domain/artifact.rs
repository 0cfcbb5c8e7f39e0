//! Artifact tree and archive models
//!
//! An [`ArtifactTree`] is the ordered list of regular files found under the
//! build output directory. An [`Archive`] is the packaged form of that tree:
//! one entry per artifact, same relative paths, same order.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tempfile::TempPath;

/// Archive path of an artifact, relative to the artifact root
///
/// Always uses forward slashes and never escapes the root: absolute paths,
/// `..`, `.` and empty paths are rejected.
///
/// # Examples
///
/// ```
/// use sitepack::domain::artifact::RelativePath;
/// use std::path::Path;
///
/// let path = RelativePath::from_path(Path::new("_next/static/app.js")).unwrap();
/// assert_eq!(path.as_str(), "_next/static/app.js");
///
/// assert!(RelativePath::new("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelativePath(String);

impl RelativePath {
    /// Creates a relative path from a forward-slash separated string
    pub fn new(path: impl Into<String>) -> Result<Self, String> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err("Relative path cannot be empty".to_string());
        }
        if path.starts_with('/') || path.contains('\\') {
            return Err(format!("Relative path must be a forward-slash relative path: {path}"));
        }
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(format!("Relative path contains an invalid segment: {path}"));
            }
        }
        Ok(Self(path))
    }

    /// Builds a relative path from a filesystem path already stripped of its root
    ///
    /// Separators are normalized to `/` regardless of the host platform.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| format!("Non UTF-8 path: {}", path.display()))?;
                    segments.push(part);
                }
                _ => {
                    return Err(format!(
                        "Path is not contained in the artifact root: {}",
                        path.display()
                    ))
                }
            }
        }
        Self::new(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A regular file discovered under the artifact root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    /// Path inside the archive
    pub path: RelativePath,
    /// Absolute location on disk (the link target for in-root symlinks)
    pub source: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
}

/// Ordered set of files produced by a build
#[derive(Debug, Clone, Default)]
pub struct ArtifactTree {
    pub root: PathBuf,
    pub entries: Vec<ArtifactEntry>,
}

impl ArtifactTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry sizes
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Entry recorded in an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub path: RelativePath,
    pub size: u64,
}

/// Where the encoded archive lives
pub enum ArchivePayload {
    /// Whole archive held in memory
    InMemory(Bytes),
    /// Archive written to a temporary file, deleted when the path is dropped
    TempFile { path: TempPath, len: u64 },
}

impl ArchivePayload {
    /// Size of the encoded archive in bytes
    pub fn len(&self) -> u64 {
        match self {
            ArchivePayload::InMemory(bytes) => bytes.len() as u64,
            ArchivePayload::TempFile { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ArchivePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchivePayload::InMemory(bytes) => {
                f.debug_tuple("InMemory").field(&bytes.len()).finish()
            }
            ArchivePayload::TempFile { path, len } => f
                .debug_struct("TempFile")
                .field("path", &path.display())
                .field("len", len)
                .finish(),
        }
    }
}

/// A complete, encoded archive of an artifact tree
#[derive(Debug)]
pub struct Archive {
    /// Entries in archive order
    pub entries: Vec<ArchiveEntry>,
    /// Encoded zip data
    pub payload: ArchivePayload,
    /// Hex-encoded SHA-256 of the encoded zip data
    pub sha256: String,
}

impl Archive {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn size(&self) -> u64 {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("index.html")]
    #[test_case("_next/static/chunks/app.js")]
    #[test_case("reports/q1/index.html")]
    fn test_relative_path_valid(input: &str) {
        let path = RelativePath::new(input).unwrap();
        assert_eq!(path.as_str(), input);
    }

    #[test_case(""; "empty")]
    #[test_case("/etc/passwd"; "absolute")]
    #[test_case("../secret"; "parent")]
    #[test_case("a/../../b"; "nested parent")]
    #[test_case("a//b"; "empty segment")]
    #[test_case("./a"; "current dir")]
    #[test_case("a\\b"; "backslash")]
    fn test_relative_path_invalid(input: &str) {
        assert!(RelativePath::new(input).is_err());
    }

    #[test]
    fn test_relative_path_from_path_normalizes_separators() {
        let path: PathBuf = ["assets", "img", "logo.png"].iter().collect();
        let rel = RelativePath::from_path(&path).unwrap();
        assert_eq!(rel.as_str(), "assets/img/logo.png");
    }

    #[test]
    fn test_relative_path_from_path_rejects_parent() {
        assert!(RelativePath::from_path(Path::new("../out/index.html")).is_err());
    }

    #[test]
    fn test_artifact_tree_totals() {
        let mut tree = ArtifactTree::new("/tmp/out");
        assert!(tree.is_empty());
        tree.entries.push(ArtifactEntry {
            path: RelativePath::new("a.html").unwrap(),
            source: PathBuf::from("/tmp/out/a.html"),
            size: 10,
        });
        tree.entries.push(ArtifactEntry {
            path: RelativePath::new("b/c.css").unwrap(),
            source: PathBuf::from("/tmp/out/b/c.css"),
            size: 5,
        });
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.total_bytes(), 15);
    }

    #[test]
    fn test_payload_len() {
        let payload = ArchivePayload::InMemory(Bytes::from_static(b"PK\x05\x06"));
        assert_eq!(payload.len(), 4);
        assert!(!payload.is_empty());
    }
}
