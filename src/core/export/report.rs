//! Export report
//!
//! One report is produced per completed local export and logged as a
//! single structured line. The CLI also prints it.

use crate::domain::Archive;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Summary of one local export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub export_id: Uuid,

    /// When the build was started
    pub started_at: DateTime<Utc>,

    /// Command line that ran
    pub command: String,

    /// Whether the container command and environment were used
    pub containerized: bool,

    /// Time spent in the build command
    pub build_ms: u64,

    /// Time spent walking and encoding the output
    pub archive_ms: u64,

    /// Number of files in the archive
    pub file_count: usize,

    /// Total size of the archived files before compression
    pub source_bytes: u64,

    /// Size of the encoded archive
    pub archive_bytes: u64,

    /// Hex SHA-256 of the encoded archive
    pub sha256: String,
}

impl ExportReport {
    /// Create a report for an export that is about to start
    pub fn new(export_id: Uuid, command: impl Into<String>, containerized: bool) -> Self {
        Self {
            export_id,
            started_at: Utc::now(),
            command: command.into(),
            containerized,
            build_ms: 0,
            archive_ms: 0,
            file_count: 0,
            source_bytes: 0,
            archive_bytes: 0,
            sha256: String::new(),
        }
    }

    pub fn with_build_duration(mut self, duration: Duration) -> Self {
        self.build_ms = duration.as_millis() as u64;
        self
    }

    /// Record the archive facts and how long archiving took
    pub fn with_archive(mut self, archive: &Archive, duration: Duration) -> Self {
        self.archive_ms = duration.as_millis() as u64;
        self.file_count = archive.entry_count();
        self.source_bytes = archive.entries.iter().map(|e| e.size).sum();
        self.archive_bytes = archive.size();
        self.sha256 = archive.sha256.clone();
        self
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.build_ms + self.archive_ms)
    }

    /// Compressed size as a percentage of the source size
    pub fn compression_ratio(&self) -> f64 {
        if self.source_bytes == 0 {
            return 100.0;
        }
        (self.archive_bytes as f64 / self.source_bytes as f64) * 100.0
    }

    pub fn log_summary(&self) {
        crate::log_export_complete!(
            self.export_id,
            self.file_count,
            self.archive_bytes,
            self.total_duration()
        );
        tracing::info!(
            export_id = %self.export_id,
            command = %self.command,
            containerized = self.containerized,
            build_ms = self.build_ms,
            archive_ms = self.archive_ms,
            source_bytes = self.source_bytes,
            compression = format!("{:.1}%", self.compression_ratio()),
            sha256 = %self.sha256,
            "Export report"
        );
    }
}
