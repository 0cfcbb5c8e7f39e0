//! Configuration schema types
//!
//! This module defines the configuration structure for Sitepack. Every section
//! has defaults, so an empty file (or no `[section]` at all) yields a working
//! origin-role configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable that switches the build into static export mode
pub const OUTPUT_MODE_ENV: &str = "NEXT_PUBLIC_OUTPUT_MODE";

/// Environment variable that selects a production build
pub const NODE_ENV: &str = "NODE_ENV";

/// Deployment role of this instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs the build locally and serves the archive
    #[default]
    Origin,
    /// Forwards export requests to a downstream origin and relays the result
    Edge,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Origin => write!(f, "origin"),
            Role::Edge => write!(f, "edge"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "origin" => Ok(Role::Origin),
            "edge" => Ok(Role::Edge),
            other => Err(format!("Invalid role '{other}'. Must be one of: origin, edge")),
        }
    }
}

/// Where the archive is assembled before it is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Build the zip in memory
    #[default]
    Memory,
    /// Build the zip in a temporary file and stream it
    TempFile,
}

/// What to do with a request that arrives while a build is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeasePolicyKind {
    /// Block until the running build finishes
    #[default]
    Wait,
    /// Fail immediately
    Reject,
    /// Wait up to `wait_timeout_secs`, then fail
    Bounded,
}

/// Main Sitepack configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SitepackConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Build command settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Single-flight lease settings
    #[serde(default)]
    pub lease: LeaseConfig,

    /// Downstream forwarding settings (edge role)
    #[serde(default)]
    pub forward: ForwardConfig,

    /// Cross-origin settings
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SitepackConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate()?;
        self.build.validate()?;
        self.archive.validate()?;
        self.lease.validate()?;
        self.forward.validate()?;
        self.cors.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment role (origin or edge)
    #[serde(default)]
    pub role: Role,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            role: Role::default(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Path of the export endpoint
    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// Additional path serving the same endpoint, for older clients (empty disables)
    #[serde(default = "default_legacy_export_path")]
    pub legacy_export_path: Option<String>,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        self.bind_address.parse::<SocketAddr>().map_err(|e| {
            format!(
                "Invalid server.bind_address '{}': {e}",
                self.bind_address
            )
        })?;

        validate_route(&self.export_path, "server.export_path")?;
        if let Some(legacy) = self.legacy_route() {
            validate_route(legacy, "server.legacy_export_path")?;
            if legacy == self.export_path {
                return Err(
                    "server.legacy_export_path must differ from server.export_path".to_string(),
                );
            }
        }
        Ok(())
    }

    /// Legacy alias route, `None` when unset or set to an empty string
    pub fn legacy_route(&self) -> Option<&str> {
        self.legacy_export_path
            .as_deref()
            .filter(|path| !path.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            export_path: default_export_path(),
            legacy_export_path: default_legacy_export_path(),
        }
    }
}

/// Build command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Shell command that produces the static output
    #[serde(default = "default_build_command")]
    pub command: String,

    /// Command used instead of `command` inside a container deployment
    #[serde(default = "default_container_command")]
    pub container_command: Option<String>,

    /// Directory the command runs in
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Output directory, relative to `working_dir` unless absolute
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Upper bound on the build duration
    #[serde(default = "default_build_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on captured stdout + stderr
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Regexes that mark a zero-exit build as failed when matched on stderr
    #[serde(default)]
    pub error_patterns: Vec<String>,

    /// Extra environment variables for the build process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl BuildConfig {
    fn validate(&self) -> Result<(), String> {
        if self.command.trim().is_empty() {
            return Err("build.command cannot be empty".to_string());
        }
        if let Some(ref cmd) = self.container_command {
            if cmd.trim().is_empty() {
                return Err("build.container_command cannot be empty when set".to_string());
            }
        }
        if self.output_dir.trim().is_empty() {
            return Err("build.output_dir cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("build.timeout_secs must be > 0".to_string());
        }
        if self.max_output_bytes == 0 {
            return Err("build.max_output_bytes must be > 0".to_string());
        }
        for pattern in &self.error_patterns {
            Regex::new(pattern)
                .map_err(|e| format!("Invalid build.error_patterns entry '{pattern}': {e}"))?;
        }
        Ok(())
    }

    /// Environment overrides passed to the build
    ///
    /// Configured variables are applied first; the static export and
    /// production flags always win.
    pub fn resolved_env(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.insert(OUTPUT_MODE_ENV.to_string(), "export".to_string());
        env.insert(NODE_ENV.to_string(), "production".to_string());
        env
    }

    /// Absolute or working-dir relative location of the output directory
    pub fn output_path(&self) -> PathBuf {
        let output = Path::new(&self.output_dir);
        if output.is_absolute() {
            output.to_path_buf()
        } else {
            Path::new(&self.working_dir).join(output)
        }
    }

    /// Command line to run for the given deployment
    pub fn command_for(&self, containerized: bool) -> &str {
        match (containerized, &self.container_command) {
            (true, Some(cmd)) => cmd,
            _ => &self.command,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            container_command: default_container_command(),
            working_dir: default_working_dir(),
            output_dir: default_output_dir(),
            timeout_secs: default_build_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            error_patterns: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

/// Archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Memory or temp-file assembly
    #[serde(default)]
    pub mode: ArchiveMode,

    /// Filename suggested to the client in Content-Disposition
    #[serde(default = "default_archive_filename")]
    pub filename: String,

    /// Directory for temp-file archives (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<String>,
}

impl ArchiveConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.filename.ends_with(".zip") {
            return Err(format!(
                "archive.filename '{}' must end with .zip",
                self.filename
            ));
        }
        if self
            .filename
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '"') || c.is_control())
        {
            return Err(format!(
                "archive.filename '{}' contains invalid characters",
                self.filename
            ));
        }
        Ok(())
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            mode: ArchiveMode::default(),
            filename: default_archive_filename(),
            temp_dir: None,
        }
    }
}

/// Single-flight lease configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// Policy for requests arriving while a build is in flight
    #[serde(default)]
    pub policy: LeasePolicyKind,

    /// Maximum wait for the `bounded` policy
    #[serde(default = "default_lease_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl LeaseConfig {
    fn validate(&self) -> Result<(), String> {
        if self.policy == LeasePolicyKind::Bounded && self.wait_timeout_secs == 0 {
            return Err("lease.wait_timeout_secs must be > 0 for the bounded policy".to_string());
        }
        Ok(())
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            policy: LeasePolicyKind::default(),
            wait_timeout_secs: default_lease_wait_timeout_secs(),
        }
    }
}

/// Downstream forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
    /// Downstream base URL inside the container network
    #[serde(default = "default_container_url")]
    pub container_url: String,

    /// Downstream base URL outside containers when no override is set
    #[serde(default = "default_downstream_url")]
    pub default_url: String,

    /// Export path on the downstream service
    #[serde(default = "default_forward_path")]
    pub path: String,

    /// Timeout for the whole downstream exchange
    #[serde(default = "default_forward_timeout_secs")]
    pub timeout_secs: u64,
}

impl ForwardConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("forward.container_url", &self.container_url),
            ("forward.default_url", &self.default_url),
        ] {
            let url = url::Url::parse(value).map_err(|e| format!("Invalid {name} '{value}': {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("{name} must use http or https, got '{value}'"));
            }
        }
        validate_route(&self.path, "forward.path")?;
        if self.timeout_secs == 0 {
            return Err("forward.timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            container_url: default_container_url(),
            default_url: default_downstream_url(),
            path: default_forward_path(),
            timeout_secs: default_forward_timeout_secs(),
        }
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Header carrying the admin API key
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

impl CorsConfig {
    fn validate(&self) -> Result<(), String> {
        let valid = !self.api_key_header.is_empty()
            && self
                .api_key_header
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(format!(
                "Invalid cors.api_key_header '{}'",
                self.api_key_header
            ));
        }
        Ok(())
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            api_key_header: default_api_key_header(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_route(path: &str, name: &str) -> Result<(), String> {
    if !path.starts_with('/') || path.len() < 2 || path.contains(char::is_whitespace) {
        return Err(format!("{name} must be an absolute path like /export, got '{path}'"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_export_path() -> String {
    "/export".to_string()
}

fn default_legacy_export_path() -> Option<String> {
    Some("/api/static-export".to_string())
}

fn default_build_command() -> String {
    "npm run build:static".to_string()
}

fn default_container_command() -> Option<String> {
    Some("npx next build".to_string())
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_build_timeout_secs() -> u64 {
    900
}

fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_archive_filename() -> String {
    "static_export.zip".to_string()
}

fn default_lease_wait_timeout_secs() -> u64 {
    60
}

fn default_container_url() -> String {
    "http://client:3000".to_string()
}

fn default_downstream_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_forward_path() -> String {
    "/api/static-export".to_string()
}

fn default_forward_timeout_secs() -> u64 {
    1200
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
