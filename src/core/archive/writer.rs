//! Zip encoding of an artifact tree

use crate::domain::{ArchiveEntry, ArchiveError, ArtifactTree};
use std::fs::File;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Permission bits recorded for every entry
const ENTRY_MODE: u32 = 0o644;

/// Write every entry of `tree` into a zip stream on `sink`
///
/// Entries carry a fixed timestamp and mode, so the same tree always encodes
/// to the same bytes. Returns the finished sink and the entries in archive order.
///
/// # Errors
///
/// Fails on the first entry that cannot be read or written; the partially
/// written sink is dropped.
pub fn write_zip<W>(tree: &ArtifactTree, sink: W) -> Result<(W, Vec<ArchiveEntry>), ArchiveError>
where
    W: Write + Seek,
{
    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(ENTRY_MODE);

    let mut entries = Vec::with_capacity(tree.len());
    for artifact in &tree.entries {
        let source = artifact.source.display().to_string();
        let mut file = File::open(&artifact.source).map_err(|e| ArchiveError::Io {
            path: source.clone(),
            message: e.to_string(),
        })?;

        zip.start_file(
            artifact.path.as_str(),
            options.large_file(artifact.size > u64::from(u32::MAX)),
        )
        .map_err(|e| ArchiveError::Zip(format!("{}: {e}", artifact.path)))?;

        let written = std::io::copy(&mut file, &mut zip).map_err(|e| ArchiveError::Io {
            path: source,
            message: e.to_string(),
        })?;

        entries.push(ArchiveEntry {
            path: artifact.path.clone(),
            size: written,
        });
    }

    let sink = zip
        .finish()
        .map_err(|e| ArchiveError::Zip(e.to_string()))?;

    Ok((sink, entries))
}
