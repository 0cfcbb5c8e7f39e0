//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Sitepack using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Sitepack - Static-Site Export Service
#[derive(Parser, Debug)]
#[command(name = "sitepack")]
#[command(version, about, long_about = None)]
#[command(author = "Sitepack Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sitepack.toml", env = "SITEPACK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SITEPACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP export service
    Serve(commands::serve::ServeArgs),

    /// Build, verify and archive once, writing the zip to a file
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
