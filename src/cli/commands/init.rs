//! Init command implementation
//!
//! This module implements the `init` command for generating a commented
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sitepack.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Sitepack configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your build command and paths", self.output);
                println!("  2. Set role = \"edge\" on instances that forward to a builder");
                println!("  3. Validate configuration: sitepack validate-config");
                println!("  4. Start the service: sitepack serve");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Default configuration with every key and a comment for each
    pub fn generate_config() -> String {
        r#"# Sitepack Configuration File
#
# Every value below is the built-in default. Any key can also be set with
# SITEPACK_<SECTION>_<KEY>, e.g. SITEPACK_BUILD_WORKING_DIR=/app.

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# origin: run the build here and serve the archive
# edge:   forward each export request to a downstream origin
role = "origin"

[server]
bind_address = "0.0.0.0:3000"
export_path = "/export"

# Second route serving the same endpoint; set to "" to disable
legacy_export_path = "/api/static-export"

[build]
# Shell command that produces the static output
command = "npm run build:static"

# Used instead of `command` when DOCKER_ENV=true
container_command = "npx next build"

# Directory the build runs in, and its output directory (relative to it)
working_dir = "."
output_dir = "out"

# Kill the build after this many seconds
timeout_secs = 900

# Fail the build when stdout + stderr exceed this many bytes
max_output_bytes = 10485760

# Regexes that fail a zero-exit build when they match stderr
error_patterns = []

# Extra environment for the build. NEXT_PUBLIC_OUTPUT_MODE=export and
# NODE_ENV=production are always set.
[build.env]
# NEXT_PUBLIC_BASE_PATH = "/reports"

[archive]
# memory:   assemble the zip in memory
# tempfile: assemble on disk and stream; the file is removed after sending
mode = "memory"
filename = "static_export.zip"
# temp_dir = "/var/tmp/sitepack"

[lease]
# What a request does while another export is running:
# wait | reject (409) | bounded (wait up to wait_timeout_secs, then 409)
policy = "wait"
wait_timeout_secs = 60

[forward]
# Downstream origin for the edge role. container_url is used when
# DOCKER_ENV=true, otherwise CLIENT_API_URL, otherwise default_url.
container_url = "http://client:3000"
default_url = "http://localhost:3000"
path = "/api/static-export"
timeout_secs = 1200

[cors]
# Header carrying the admin API key; forwarded downstream when present
api_key_header = "x-api-key"

[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "./logs"
# daily or hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
