//! Core business logic for Sitepack.
//!
//! # Modules
//!
//! - [`build`] - Build command execution and outcome classification
//! - [`verification`] - Output directory checks
//! - [`archive`] - Zip packaging of the output tree
//! - [`lease`] - Single-flight guard for local exports
//! - [`export`] - Strategies and the export orchestrator
//!
//! # Export Workflow
//!
//! For the origin role:
//!
//! 1. **Lease**: wait for, or give up on, the single export slot
//! 2. **Build**: run the build command with the export environment
//! 3. **Verify**: require a non-empty output directory
//! 4. **Archive**: zip the output tree, in memory or via a temp file
//! 5. **Report**: log the export report
//!
//! The edge role replaces steps 1 to 4 with a single downstream request.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitepack::config::{deployment::env_provider, load_config};
//! use sitepack::core::export::{ExportOrchestrator, ExportResponse};
//! use sitepack::domain::{ExportMethod, ExportRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sitepack.toml")?;
//! let orchestrator = ExportOrchestrator::from_config(&config, env_provider())?;
//!
//! match orchestrator.handle(&ExportRequest::new(ExportMethod::Post)).await {
//!     ExportResponse::Artifact(_) => println!("Archive ready"),
//!     ExportResponse::Failed(failure) => println!("{}: {}", failure.error, failure.details),
//!     ExportResponse::Preflight => {}
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod build;
pub mod export;
pub mod lease;
pub mod verification;
