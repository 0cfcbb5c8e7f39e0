//! Archive packaging of build output
//!
//! The [`Archiver`] turns a verified output directory into a single zip
//! [`Archive`]. Work runs on the blocking pool. Any failure discards the
//! partial archive, including its temporary file.
//!
//! # Modes
//!
//! - [`ArchiveMode::Memory`]: the zip is built in a `Vec<u8>`
//! - [`ArchiveMode::TempFile`]: the zip is written to a temporary file that is
//!   deleted when the returned payload is dropped

pub mod checksum;
pub mod walker;
pub mod writer;

pub use checksum::{checksum, checksum_file};
pub use walker::collect_tree;
pub use writer::write_zip;

use crate::config::{ArchiveConfig, ArchiveMode};
use crate::domain::{Archive, ArchiveError, ArchivePayload, ArtifactTree};
use axum::body::Bytes;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Packages artifact trees into zip archives
#[derive(Debug, Clone)]
pub struct Archiver {
    mode: ArchiveMode,
    temp_dir: Option<PathBuf>,
}

impl Archiver {
    pub fn new(mode: ArchiveMode) -> Self {
        Self {
            mode,
            temp_dir: None,
        }
    }

    /// Create an archiver from the `[archive]` configuration section
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            mode: config.mode,
            temp_dir: config.temp_dir.as_ref().map(PathBuf::from),
        }
    }

    /// Directory for temp-file archives
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn mode(&self) -> ArchiveMode {
        self.mode
    }

    /// Archive every file under `root` on the blocking pool
    pub async fn archive(&self, root: &Path) -> Result<Archive, ArchiveError> {
        let archiver = self.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || archiver.archive_blocking(&root))
            .await
            .map_err(|e| ArchiveError::Join(e.to_string()))?
    }

    /// Archive every file under `root` on the current thread
    pub fn archive_blocking(&self, root: &Path) -> Result<Archive, ArchiveError> {
        let start = Instant::now();
        let tree = collect_tree(root)?;

        let archive = match self.mode {
            ArchiveMode::Memory => {
                let (cursor, entries) = write_zip(&tree, Cursor::new(Vec::new()))?;
                let bytes = cursor.into_inner();
                let sha256 = checksum(&bytes);
                Archive {
                    entries,
                    payload: ArchivePayload::InMemory(Bytes::from(bytes)),
                    sha256,
                }
            }
            ArchiveMode::TempFile => self.archive_to_temp_file(&tree)?,
        };

        tracing::info!(
            root = %root.display(),
            entries = archive.entry_count(),
            bytes = archive.size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Archive created"
        );

        Ok(archive)
    }

    fn archive_to_temp_file(&self, tree: &ArtifactTree) -> Result<Archive, ArchiveError> {
        let temp = match &self.temp_dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|e| ArchiveError::Io {
            path: self
                .temp_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
            message: e.to_string(),
        })?;
        let temp_display = temp.path().display().to_string();
        let io_error = |e: std::io::Error| ArchiveError::Io {
            path: temp_display.clone(),
            message: e.to_string(),
        };

        let (writer, entries) = write_zip(tree, BufWriter::new(temp))?;
        let temp = writer.into_inner().map_err(|e| io_error(e.into_error()))?;
        temp.as_file().sync_all().map_err(io_error)?;

        let len = temp.as_file().metadata().map_err(io_error)?.len();
        let sha256 = checksum_file(temp.path()).map_err(io_error)?;

        Ok(Archive {
            entries,
            payload: ArchivePayload::TempFile {
                path: temp.into_temp_path(),
                len,
            },
            sha256,
        })
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new(ArchiveMode::default())
    }
}
