//! Serve command implementation
//!
//! Runs the HTTP export service until SIGINT or SIGTERM.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::config::deployment::env_provider;
use crate::config::{load_config, Role, SitepackConfig};
use crate::server;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override server.bind_address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Override application.role (origin or edge)
    #[arg(long)]
    pub role: Option<Role>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting serve command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            tracing::error!(error = %e, "Invalid command line override");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        println!(
            "🚀 Sitepack {} listening on {} ({} role)",
            env!("CARGO_PKG_VERSION"),
            config.server.bind_address,
            config.application.role
        );

        match server::serve(&config, env_provider(), shutdown_signal).await {
            Ok(()) => {
                println!("👋 Server stopped");
                Ok(EXIT_OK)
            }
            Err(e) => {
                tracing::error!(error = %e, "Server failed");
                eprintln!("Server failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Apply `--bind` and `--role` on top of the loaded configuration
    fn apply_overrides(&self, config: &mut SitepackConfig) -> Result<(), String> {
        if let Some(bind) = &self.bind {
            tracing::info!(bind = %bind, "Overriding bind address from CLI");
            config.server.bind_address = bind.clone();
        }
        if let Some(role) = self.role {
            tracing::info!(role = %role, "Overriding role from CLI");
            config.application.role = role;
        }
        config.validate()
    }
}
