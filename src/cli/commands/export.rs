//! Export command implementation
//!
//! Runs one local build, verifies the output and writes the archive to a
//! file. No HTTP server is started.

use super::{EXIT_BUILD, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::config::deployment::env_provider;
use crate::config::load_config;
use crate::core::export::{ExportReport, LocalBuilder};
use crate::domain::{Archive, ArchivePayload, SitepackError};
use clap::Args;
use std::path::Path;
use tokio::sync::watch;
use uuid::Uuid;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Where to write the zip archive
    #[arg(short, long, default_value = "static_export.zip")]
    pub output: String,

    /// Print the export report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Starting export command");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let builder = match LocalBuilder::from_config(&config, env_provider()) {
            Ok(builder) => builder,
            Err(e) => {
                eprintln!("Configuration validation failed: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("📦 Building static export with: {}", config.build.command);

        let export_id = Uuid::new_v4();
        let result = tokio::select! {
            result = builder.run_attached(export_id) => result,
            Ok(_) = shutdown_signal.wait_for(|stop| *stop) => {
                tracing::warn!(export_id = %export_id, "Export interrupted by shutdown signal");
                eprintln!("Export interrupted");
                return Ok(EXIT_FATAL);
            }
        };

        let (archive, report) = match result {
            Ok(done) => done,
            Err(e) => return Ok(self.report_failure(&e)),
        };

        let output = Path::new(&self.output);
        if let Err(e) = write_archive(archive, output).await {
            tracing::error!(output = %self.output, error = %e, "Failed to write archive");
            eprintln!("Failed to write {}: {e}", self.output);
            return Ok(EXIT_FATAL);
        }

        report.log_summary();
        self.print_report(&report)?;
        Ok(EXIT_OK)
    }

    fn report_failure(&self, error: &SitepackError) -> i32 {
        crate::log_error_with_context!(error, "Static export failed");
        eprintln!("❌ Static export failed");
        match error {
            SitepackError::Build(e) => {
                eprintln!("   {e}");
                let output = e.output();
                if !output.is_empty() {
                    eprintln!();
                    eprintln!("{output}");
                }
                EXIT_BUILD
            }
            SitepackError::Verification(e) => {
                eprintln!("   {e}");
                EXIT_BUILD
            }
            SitepackError::Configuration(e) => {
                eprintln!("   {e}");
                EXIT_CONFIG
            }
            other => {
                eprintln!("   {other}");
                EXIT_FATAL
            }
        }
    }

    fn print_report(&self, report: &ExportReport) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
            return Ok(());
        }

        println!();
        println!("✅ Static export written to {}", self.output);
        println!();
        println!("Export Summary:");
        println!("  Export ID: {}", report.export_id);
        println!("  Started: {}", report.started_at.to_rfc3339());
        println!("  Command: {}", report.command);
        println!("  Files: {}", report.file_count);
        println!(
            "  Size: {} bytes ({:.1}% of {} source bytes)",
            report.archive_bytes,
            report.compression_ratio(),
            report.source_bytes
        );
        println!("  Build: {} ms", report.build_ms);
        println!("  Archive: {} ms", report.archive_ms);
        println!("  SHA-256: {}", report.sha256);
        Ok(())
    }
}

/// Copy the archive payload to `destination`
///
/// A temp-file payload is removed once the copy is done.
pub async fn write_archive(archive: Archive, destination: &Path) -> std::io::Result<()> {
    match archive.payload {
        ArchivePayload::InMemory(bytes) => tokio::fs::write(destination, &bytes).await,
        ArchivePayload::TempFile { path, .. } => {
            tokio::fs::copy(&path, destination).await?;
            Ok(())
        }
    }
}
