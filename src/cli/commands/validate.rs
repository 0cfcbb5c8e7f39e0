//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Sitepack configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::adapters::forward::resolve_target;
use crate::config::{load_config, DeploymentContext, Role, SitepackConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// [`load_config`] validates as part of loading, so a config that loads
    /// is valid.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for line in summary(&config, &DeploymentContext::detect()) {
            println!("{line}");
        }
        println!();
        Ok(EXIT_OK)
    }
}

/// Human-readable summary lines for a loaded configuration
fn summary(config: &SitepackConfig, context: &DeploymentContext) -> Vec<String> {
    let mut lines = vec![
        "Configuration Summary:".to_string(),
        format!("  Log Level: {}", config.application.log_level),
        format!("  Role: {}", config.application.role),
        format!("  Bind Address: {}", config.server.bind_address),
        format!("  Export Path: {}", config.server.export_path),
    ];
    if let Some(legacy) = config.server.legacy_route() {
        lines.push(format!("  Legacy Export Path: {legacy}"));
    }
    lines.push(format!("  Containerized: {}", context.containerized));

    match config.application.role {
        Role::Origin => {
            lines.push(format!(
                "  Build Command: {}",
                config.build.command_for(context.containerized)
            ));
            lines.push(format!("  Working Dir: {}", config.build.working_dir));
            lines.push(format!(
                "  Output Dir: {}",
                config.build.output_path().display()
            ));
            lines.push(format!("  Build Timeout: {}s", config.build.timeout_secs));
            lines.push(format!("  Archive Mode: {:?}", config.archive.mode));
            lines.push(format!("  Lease Policy: {:?}", config.lease.policy));
        }
        Role::Edge => {
            let target = resolve_target(&config.forward, context)
                .map(|t| t.to_string())
                .unwrap_or_else(|e| format!("unresolvable ({e})"));
            lines.push(format!("  Downstream: {target}"));
            lines.push(format!("  Forward Timeout: {}s", config.forward.timeout_secs));
        }
    }

    lines.push(format!("  Archive Filename: {}", config.archive.filename));
    lines.push(format!("  File Logging: {}", config.logging.local_enabled));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_origin_summary() {
        let config = SitepackConfig::default();
        let lines = summary(&config, &DeploymentContext::new(false, None));
        assert!(lines.contains(&"  Role: origin".to_string()));
        assert!(lines.contains(&"  Build Command: npm run build:static".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Downstream")));
    }

    #[test]
    fn test_edge_summary_shows_resolved_target() {
        let mut config = SitepackConfig::default();
        config.application.role = Role::Edge;
        let context = DeploymentContext::new(true, None);

        let lines = summary(&config, &context);
        assert!(lines.contains(&"  Downstream: http://client:3000/api/static-export".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Build Command")));
    }

    #[tokio::test]
    async fn test_invalid_config_exit_code() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[archive]\nfilename = \"export.tar\"\n").unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
