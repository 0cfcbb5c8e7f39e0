//! Structured logging
//!
//! Console output is always on and follows `RUST_LOG` when set, otherwise
//! `application.log_level`. With `logging.local_enabled` each event is also
//! written as one JSON line to a file under `logging.local_path`, rotated per
//! `logging.local_rotation`.
//! Export lifecycle events go through the macros below so their field names
//! stay the same across the server and CLI paths.
//!
//! # Example
//!
//! ```no_run
//! use sitepack::logging::init_logging;
//! use sitepack::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Server started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a local export build
///
/// # Example
///
/// ```no_run
/// use sitepack::log_export_start;
///
/// let export_id = uuid::Uuid::new_v4();
/// log_export_start!(export_id, "npm run build:static");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($export_id:expr, $command:expr) => {
        tracing::info!(
            export_id = %$export_id,
            command = %$command,
            "Starting export"
        );
    };
}

/// Log the completion of a local export
///
/// # Example
///
/// ```no_run
/// use sitepack::log_export_complete;
/// use std::time::Duration;
///
/// let export_id = uuid::Uuid::new_v4();
/// log_export_complete!(export_id, 42, 1_048_576u64, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($export_id:expr, $entries:expr, $bytes:expr, $duration:expr) => {
        tracing::info!(
            export_id = %$export_id,
            entries = $entries,
            bytes = $bytes,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sitepack::log_error_with_context;
/// use sitepack::domain::SitepackError;
///
/// let error = SitepackError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
