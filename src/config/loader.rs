//! Configuration loader: TOML file, `${VAR}` substitution, `SITEPACK_*` overrides

use super::schema::SitepackConfig;
use crate::domain::errors::SitepackError;
use crate::domain::result::Result;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "SITEPACK_";

/// Load, override and validate the configuration at `path`
///
/// Order of precedence, lowest first: built-in defaults, the file (after
/// `${VAR}` substitution), then `SITEPACK_<SECTION>_<KEY>` variables.
///
/// # Errors
///
/// Returns [`SitepackError::Configuration`] when the file is missing or
/// unreadable, a referenced variable is unset, the TOML does not parse, an
/// override has an invalid value, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use sitepack::config::loader::load_config;
///
/// let config = load_config("sitepack.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SitepackConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SitepackError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path).map_err(|e| {
        SitepackError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "Loaded configuration file");

    load_config_from_str(&raw)
}

/// Same pipeline as [`load_config`] for TOML text already in memory
pub fn load_config_from_str(raw: &str) -> Result<SitepackConfig> {
    let expanded = substitute_env_vars(raw)?;
    let mut config: SitepackConfig = toml::from_str(&expanded)
        .map_err(|e| SitepackError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config
        .validate()
        .map_err(|e| SitepackError::Configuration(format!("Configuration validation failed: {e}")))?;
    Ok(config)
}

/// Replace `${VAR_NAME}` with the variable's value
///
/// Lines starting with `#` are left alone, so commented-out examples may
/// reference unset variables.
///
/// # Errors
///
/// Lists every unset variable referenced outside comments.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SitepackError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut missing: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &Captures| match std::env::var(&caps[1]) {
                Ok(value) => value,
                Err(_) => {
                    if !missing.iter().any(|m| m == &caps[1]) {
                        missing.push(caps[1].to_string());
                    }
                    caps[0].to_string()
                }
            })
            .into_owned()
        })
        .collect();

    if !missing.is_empty() {
        return Err(SitepackError::Configuration(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )));
    }

    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}

/// Apply `SITEPACK_<SECTION>_<KEY>` overrides read through `lookup`
fn apply_env_overrides<F>(config: &mut SitepackConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

    if let Some(v) = var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = v;
    }
    if let Some(v) = var("APPLICATION_ROLE") {
        config.application.role = parse_from_str("APPLICATION_ROLE", &v)?;
    }
    if let Some(v) = var("SERVER_BIND_ADDRESS") {
        config.server.bind_address = v;
    }

    if let Some(v) = var("BUILD_COMMAND") {
        config.build.command = v;
    }
    if let Some(v) = var("BUILD_CONTAINER_COMMAND") {
        config.build.container_command = Some(v);
    }
    if let Some(v) = var("BUILD_WORKING_DIR") {
        config.build.working_dir = v;
    }
    if let Some(v) = var("BUILD_OUTPUT_DIR") {
        config.build.output_dir = v;
    }
    if let Some(v) = var("BUILD_TIMEOUT_SECS") {
        config.build.timeout_secs = parse_from_str("BUILD_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = var("BUILD_MAX_OUTPUT_BYTES") {
        config.build.max_output_bytes = parse_from_str("BUILD_MAX_OUTPUT_BYTES", &v)?;
    }

    if let Some(v) = var("ARCHIVE_MODE") {
        config.archive.mode = parse_keyword("ARCHIVE_MODE", &v)?;
    }
    if let Some(v) = var("ARCHIVE_TEMP_DIR") {
        config.archive.temp_dir = Some(v);
    }

    if let Some(v) = var("LEASE_POLICY") {
        config.lease.policy = parse_keyword("LEASE_POLICY", &v)?;
    }
    if let Some(v) = var("LEASE_WAIT_TIMEOUT_SECS") {
        config.lease.wait_timeout_secs = parse_from_str("LEASE_WAIT_TIMEOUT_SECS", &v)?;
    }

    if let Some(v) = var("FORWARD_CONTAINER_URL") {
        config.forward.container_url = v;
    }
    if let Some(v) = var("FORWARD_DEFAULT_URL") {
        config.forward.default_url = v;
    }
    if let Some(v) = var("FORWARD_TIMEOUT_SECS") {
        config.forward.timeout_secs = parse_from_str("FORWARD_TIMEOUT_SECS", &v)?;
    }

    if let Some(v) = var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_from_str("LOGGING_LOCAL_ENABLED", &v)?;
    }
    if let Some(v) = var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = v;
    }

    Ok(())
}

fn parse_from_str<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        SitepackError::Configuration(format!("Invalid {ENV_PREFIX}{key} '{value}': {e}"))
    })
}

/// Parse a lowercase enum keyword the same way the TOML file would
fn parse_keyword<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase())).map_err(|e| {
        SitepackError::Configuration(format!("Invalid {ENV_PREFIX}{key} '{value}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Serializes tests that touch process environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_substitute_env_vars() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var("SITEPACK_TEST_VAR", "test_value");
        let input = "command = \"${SITEPACK_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "command = \"test_value\"\n");
        std::env::remove_var("SITEPACK_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::remove_var("SITEPACK_MISSING_VAR");
        let input = "command = \"${SITEPACK_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# command = \"${SITEPACK_NEVER_SET_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${SITEPACK_NEVER_SET_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-sitepack.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let toml_content = r#"
[application]
log_level = "debug"
role = "edge"

[build]
command = "pnpm build"
working_dir = "/srv/client"
timeout_secs = 300

[build.env]
NEXT_PUBLIC_BASE_PATH = "/reports"

[archive]
mode = "tempfile"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.application.role, crate::config::Role::Edge);
        assert_eq!(config.build.command, "pnpm build");
        assert_eq!(config.build.timeout_secs, 300);
        assert_eq!(
            config.build.env.get("NEXT_PUBLIC_BASE_PATH").unwrap(),
            "/reports"
        );
        assert_eq!(config.archive.mode, crate::config::ArchiveMode::TempFile);
    }

    #[test]
    fn test_load_config_invalid_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let result = load_config_from_str("[build]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(SitepackError::Configuration(_))));
    }

    #[test]
    fn test_env_overrides_from_lookup() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("SITEPACK_APPLICATION_ROLE", "Edge"),
            ("SITEPACK_LEASE_POLICY", "bounded"),
            ("SITEPACK_ARCHIVE_MODE", "TempFile"),
            ("SITEPACK_BUILD_TIMEOUT_SECS", "120"),
            ("SITEPACK_LOGGING_LOCAL_ENABLED", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = SitepackConfig::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.application.role, crate::config::Role::Edge);
        assert_eq!(config.lease.policy, crate::config::LeasePolicyKind::Bounded);
        assert_eq!(config.archive.mode, crate::config::ArchiveMode::TempFile);
        assert_eq!(config.build.timeout_secs, 120);
        assert!(config.logging.local_enabled);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = SitepackConfig::default();
        let result = apply_env_overrides(&mut config, |key| {
            (key == "SITEPACK_FORWARD_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        match result {
            Err(SitepackError::Configuration(message)) => {
                assert!(message.contains("SITEPACK_FORWARD_TIMEOUT_SECS"))
            }
            other => panic!("Expected configuration error, got {other:?}"),
        }
    }
}
