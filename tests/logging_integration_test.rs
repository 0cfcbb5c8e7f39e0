//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so the
//! initialization checks share a single test.

use sitepack::config::LoggingConfig;
use sitepack::logging::init_logging;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "./logs");
}

#[test]
fn test_invalid_level_rejected_before_install() {
    let config = LoggingConfig::default();
    assert!(init_logging("verbose", &config).is_err());
}

#[test]
fn test_file_logging_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "hourly".to_string(),
    };

    let guard = init_logging("info", &config).unwrap();
    assert_eq!(guard.log_dir(), Some(&log_path));
    assert!(log_path.is_dir());

    // A second subscriber cannot be installed
    assert!(init_logging("info", &LoggingConfig::default()).is_err());

    // Dropping the guard flushes the background writer
    drop(guard);

    let files: Vec<_> = fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("sitepack.log")
        })
        .collect();
    assert_eq!(files.len(), 1);

    let contents = fs::read_to_string(files[0].path()).unwrap();
    let first = contents.lines().next().unwrap();
    let json: serde_json::Value = serde_json::from_str(first).unwrap();
    assert!(json["fields"]["message"]
        .as_str()
        .unwrap()
        .contains("Logging initialized"));
}
