//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not
//! interfere with each other.

use sitepack::config::{load_config, ArchiveMode, LeasePolicyKind, Role};
use sitepack::domain::SitepackError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("SITEPACK_APPLICATION_ROLE");
    std::env::remove_var("SITEPACK_BUILD_WORKING_DIR");
    std::env::remove_var("SITEPACK_LEASE_POLICY");
    std::env::remove_var("SITEPACK_ARCHIVE_MODE");
    std::env::remove_var("TEST_BUILD_ROOT");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"
role = "origin"

[server]
bind_address = "127.0.0.1:8080"
export_path = "/admin/export"
legacy_export_path = ""

[build]
command = "pnpm run export"
container_command = "pnpm exec next build"
working_dir = "/srv/client"
output_dir = "dist"
timeout_secs = 600
max_output_bytes = 1048576
error_patterns = ["Error occurred prerendering"]

[build.env]
NEXT_PUBLIC_BASE_PATH = "/reports"

[archive]
mode = "tempfile"
filename = "site.zip"
temp_dir = "/var/tmp"

[lease]
policy = "bounded"
wait_timeout_secs = 30

[forward]
container_url = "http://builder:3000"
default_url = "http://localhost:4000"
timeout_secs = 300

[cors]
api_key_header = "x-admin-key"

[logging]
local_enabled = false
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    assert_eq!(config.server.export_path, "/admin/export");
    assert!(config.server.legacy_route().is_none());
    assert_eq!(config.build.command_for(false), "pnpm run export");
    assert_eq!(config.build.command_for(true), "pnpm exec next build");
    assert_eq!(
        config.build.output_path(),
        std::path::PathBuf::from("/srv/client/dist")
    );
    assert_eq!(config.build.error_patterns.len(), 1);
    assert_eq!(
        config.build.resolved_env().get("NEXT_PUBLIC_BASE_PATH").unwrap(),
        "/reports"
    );
    assert_eq!(config.archive.mode, ArchiveMode::TempFile);
    assert_eq!(config.archive.filename, "site.zip");
    assert_eq!(config.lease.policy, LeasePolicyKind::Bounded);
    assert_eq!(config.lease.wait_timeout_secs, 30);
    assert_eq!(config.forward.default_url, "http://localhost:4000");
    assert_eq!(config.cors.api_key_header, "x-admin-key");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_file_yields_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.role, Role::Origin);
    assert_eq!(config.server.export_path, "/export");
    assert_eq!(config.server.legacy_route(), Some("/api/static-export"));
    assert_eq!(config.build.timeout_secs, 900);
    assert_eq!(config.build.max_output_bytes, 10 * 1024 * 1024);
    assert!(config.build.error_patterns.is_empty());
    assert_eq!(config.archive.mode, ArchiveMode::Memory);
    assert_eq!(config.forward.timeout_secs, 1200);
}

#[test]
fn test_env_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_BUILD_ROOT", "/opt/site");

    let file = write_config(
        r#"
[build]
# working_dir = "${UNSET_IN_COMMENT}"
working_dir = "${TEST_BUILD_ROOT}"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.build.working_dir, "/opt/site");

    cleanup_env_vars();
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("SITEPACK_APPLICATION_ROLE", "edge");
    std::env::set_var("SITEPACK_BUILD_WORKING_DIR", "/app");
    std::env::set_var("SITEPACK_LEASE_POLICY", "reject");
    std::env::set_var("SITEPACK_ARCHIVE_MODE", "tempfile");

    let file = write_config("[build]\nworking_dir = \"/ignored\"\n");
    let result = load_config(file.path());
    cleanup_env_vars();

    let config = result.unwrap();
    assert_eq!(config.application.role, Role::Edge);
    assert_eq!(config.build.working_dir, "/app");
    assert_eq!(config.lease.policy, LeasePolicyKind::Reject);
    assert_eq!(config.archive.mode, ArchiveMode::TempFile);
}

#[test]
fn test_invalid_env_override_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("SITEPACK_APPLICATION_ROLE", "mirror");

    let file = write_config("");
    let result = load_config(file.path());
    cleanup_env_vars();

    assert!(matches!(result, Err(SitepackError::Configuration(_))));
}

#[test]
fn test_validation_errors() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"verbose\"\n",
        "[build]\ncommand = \"  \"\n",
        "[build]\ntimeout_secs = 0\n",
        "[build]\nmax_output_bytes = 0\n",
        "[build]\nerror_patterns = [\"(unclosed\"]\n",
        "[archive]\nfilename = \"site.tar.gz\"\n",
        "[archive]\nfilename = \"../site.zip\"\n",
        "[lease]\npolicy = \"bounded\"\nwait_timeout_secs = 0\n",
        "[forward]\ndefault_url = \"ftp://builder\"\n",
        "[server]\nbind_address = \"localhost\"\n",
        "[server]\nexport_path = \"export\"\n",
        "[cors]\napi_key_header = \"x api key\"\n",
    ];

    for contents in cases {
        let file = write_config(contents);
        let result = load_config(file.path());
        assert!(
            matches!(result, Err(SitepackError::Configuration(_))),
            "expected configuration error for {contents:?}"
        );
    }
}

#[test]
fn test_missing_file() {
    let result = load_config("/nonexistent/sitepack.toml");
    match result {
        Err(SitepackError::Configuration(message)) => assert!(message.contains("not found")),
        other => panic!("Expected configuration error, got {other:?}"),
    }
}
