//! Artifact tree discovery

use crate::domain::{ArchiveError, ArtifactEntry, ArtifactTree, RelativePath};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `root` and collect every regular file in archive order
///
/// Entries are sorted by file name at each level, so the order is stable for
/// an unchanged tree. Symbolic links are never followed by the walk. A link is
/// kept only when it resolves to a regular file inside `root`, and it is then
/// archived under its own path.
///
/// Names that cannot be written as a zip entry path (not UTF-8, or containing
/// `\`) are skipped with a warning naming the file.
///
/// # Errors
///
/// Any unreadable entry aborts the walk with [`ArchiveError::Io`].
pub fn collect_tree(root: &Path) -> Result<ArtifactTree, ArchiveError> {
    let canonical_root = root.canonicalize().map_err(|e| ArchiveError::Io {
        path: root.display().to_string(),
        message: e.to_string(),
    })?;

    let mut tree = ArtifactTree::new(root);

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::Io {
            path: e
                .path()
                .unwrap_or(root)
                .display()
                .to_string(),
            message: e.to_string(),
        })?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| ArchiveError::InvalidPath(entry.path().display().to_string()))?;
        let path = match RelativePath::from_path(relative) {
            Ok(path) => path,
            Err(reason) => {
                tracing::warn!(
                    entry = %entry.path().display(),
                    reason = %reason,
                    "Skipping output file whose name cannot be archived"
                );
                continue;
            }
        };

        if file_type.is_file() {
            let size = entry
                .metadata()
                .map_err(|e| ArchiveError::Io {
                    path: entry.path().display().to_string(),
                    message: e.to_string(),
                })?
                .len();
            tree.entries.push(ArtifactEntry {
                path,
                source: entry.path().to_path_buf(),
                size,
            });
        } else if file_type.is_symlink() {
            match resolve_contained_link(entry.path(), &canonical_root) {
                Some((target, size)) => tree.entries.push(ArtifactEntry {
                    path,
                    source: target,
                    size,
                }),
                None => tracing::warn!(
                    link = %entry.path().display(),
                    "Skipping symlink that does not resolve to a file inside the output directory"
                ),
            }
        }
    }

    Ok(tree)
}

/// Target and size of a link that points at a regular file under `canonical_root`
fn resolve_contained_link(link: &Path, canonical_root: &Path) -> Option<(PathBuf, u64)> {
    let target = link.canonicalize().ok()?;
    if !target.starts_with(canonical_root) {
        return None;
    }
    let metadata = std::fs::metadata(&target).ok()?;
    metadata.is_file().then(|| (target, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(tree: &ArtifactTree) -> Vec<&str> {
        tree.entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_collects_files_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("a/nested")).unwrap();
        fs::write(root.join("z.html"), "z").unwrap();
        fs::write(root.join("b/index.html"), "b").unwrap();
        fs::write(root.join("a/nested/app.js"), "js").unwrap();
        fs::write(root.join("a/index.html"), "a").unwrap();

        let tree = collect_tree(root).unwrap();
        assert_eq!(
            paths(&tree),
            vec!["a/index.html", "a/nested/app.js", "b/index.html", "z.html"]
        );
        assert_eq!(tree.total_bytes(), 5);
    }

    #[test]
    fn test_empty_directories_produce_no_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty/deeper")).unwrap();

        let tree = collect_tree(dir.path()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            collect_tree(&dir.path().join("missing")),
            Err(ArchiveError::Io { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_kept() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), "home").unwrap();
        std::os::unix::fs::symlink(root.join("index.html"), root.join("alias.html")).unwrap();

        let tree = collect_tree(root).unwrap();
        assert_eq!(paths(&tree), vec!["alias.html", "index.html"]);
        assert_eq!(tree.entries[0].size, 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_root_is_skipped() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), "home").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.join("leak.txt"))
            .unwrap();
        std::os::unix::fs::symlink(root.join("gone.html"), root.join("dangling.html")).unwrap();

        let tree = collect_tree(root).unwrap();
        assert_eq!(paths(&tree), vec!["index.html"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unarchivable_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("back\\slash.html"), "b").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"latin\xe9.html")), "l").unwrap();

        let tree = collect_tree(root).unwrap();
        assert_eq!(paths(&tree), vec!["index.html"]);
        assert_eq!(tree.total_bytes(), 4);
    }
}
