//! Configuration management for Sitepack.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Sitepack uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SITEPACK_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! Deployment facts that change between environments (`DOCKER_ENV`,
//! `CLIENT_API_URL`) are not part of the file; see [`deployment`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sitepack::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sitepack.toml")?;
//!
//! println!("Role: {}", config.application.role);
//! println!("Build command: {}", config.build.command);
//! println!("Output dir: {}", config.build.output_path().display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and deployment role
//! - [`ServerConfig`] - Listener address and routes
//! - [`BuildConfig`] - Build command, directories, limits and environment
//! - [`ArchiveConfig`] - Archive assembly mode and filename
//! - [`LeaseConfig`] - Policy for concurrent export requests
//! - [`ForwardConfig`] - Downstream addresses for the edge role
//! - [`CorsConfig`] - API key header name
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! role = "origin"
//!
//! [build]
//! command = "npm run build:static"
//! working_dir = "/app"
//! output_dir = "out"
//! timeout_secs = 900
//!
//! [archive]
//! mode = "tempfile"
//! filename = "static_export.zip"
//!
//! [lease]
//! policy = "bounded"
//! wait_timeout_secs = 120
//! ```

pub mod deployment;
pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use deployment::{ContextProvider, DeploymentContext};
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, ArchiveConfig, ArchiveMode, BuildConfig, CorsConfig, ForwardConfig,
    LeaseConfig, LeasePolicyKind, LoggingConfig, Role, ServerConfig, SitepackConfig,
};
pub use secret::{api_key_from_header, secret_string, SecretString, SecretValue};
