// Sitepack - Static-Site Export Service
// Copyright (c) 2025 Sitepack Contributors
// Licensed under the MIT License

//! # Sitepack - Static-Site Export Service
//!
//! Sitepack builds a web application into a static artifact tree, verifies the
//! output, packs it into a zip archive and returns that archive over HTTP.
//!
//! ## Overview
//!
//! An instance runs in one of two roles:
//!
//! - **origin**: runs the build command locally, verifies the output directory,
//!   archives it and streams the zip to the caller
//! - **edge**: forwards the export request to a downstream origin and relays
//!   its response unmodified, with its own CORS headers
//!
//! Only one local export runs at a time. Concurrent requests wait, are
//! rejected, or wait for a bounded time, depending on the lease policy.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`server`] - axum router, handlers and response assembly
//! - [`core`] - Business logic (build, verification, archive, lease, export)
//! - [`adapters`] - Downstream forwarding client
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitepack::config::deployment::env_provider;
//! use sitepack::config::load_config;
//! use sitepack::core::export::LocalBuilder;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sitepack.toml")?;
//!     let builder = LocalBuilder::from_config(&config, env_provider())?;
//!
//!     let (archive, report) = builder.run(Uuid::new_v4()).await?;
//!
//!     println!("Archived {} files ({} bytes)", archive.entry_count(), report.archive_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::SitepackError`]. The orchestrator turns every
//! error into an [`core::export::ExportFailure`], which the server renders as
//! `{"error": ..., "details": ...}`:
//!
//! ```rust
//! use sitepack::core::export::ExportFailure;
//! use sitepack::domain::SitepackError;
//!
//! let failure = ExportFailure::from(&SitepackError::LeaseBusy);
//! assert_eq!(failure.status, 409);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
