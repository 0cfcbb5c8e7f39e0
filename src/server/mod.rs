//! HTTP server for the export endpoint
//!
//! # Routes
//!
//! | Method              | Path                        | Purpose                  |
//! |---------------------|-----------------------------|--------------------------|
//! | GET, POST, OPTIONS  | `server.export_path`        | Trigger an export        |
//! | GET, POST, OPTIONS  | `server.legacy_export_path` | Same, for older clients  |
//! | GET                 | `/health`                   | Liveness and role        |
//!
//! Other methods on the export paths get `405` with CORS headers.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitepack::config::{deployment::env_provider, SitepackConfig};
//! use sitepack::server;
//!
//! # async fn example() -> sitepack::domain::Result<()> {
//! let config = SitepackConfig::default();
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! server::serve(&config, env_provider(), shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

pub mod response;
pub mod routes;

pub use routes::router;

use crate::config::{ContextProvider, Role, SitepackConfig};
use crate::core::export::ExportOrchestrator;
use crate::domain::{Result, SitepackError};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Header-related settings shared by all responses
#[derive(Debug, Clone)]
pub struct ResponseSettings {
    /// Inbound header carrying the API key; also listed in CORS allowed headers
    pub api_key_header: String,
    /// Filename in `Content-Disposition`
    pub filename: String,
}

impl ResponseSettings {
    pub fn from_config(config: &SitepackConfig) -> Self {
        Self {
            api_key_header: config.cors.api_key_header.to_lowercase(),
            filename: config.archive.filename.clone(),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ExportOrchestrator,
    pub settings: Arc<ResponseSettings>,
    pub role: Role,
}

impl AppState {
    pub fn new(orchestrator: ExportOrchestrator, config: &SitepackConfig) -> Self {
        Self {
            orchestrator,
            settings: Arc::new(ResponseSettings::from_config(config)),
            role: config.application.role,
        }
    }
}

/// Build the router for `config` with the strategy for its role
pub fn app(config: &SitepackConfig, context: ContextProvider) -> Result<Router> {
    let orchestrator = ExportOrchestrator::from_config(config, context)?;
    Ok(router(AppState::new(orchestrator, config), &config.server))
}

/// Bind `server.bind_address` and serve until `shutdown` turns true
pub async fn serve(
    config: &SitepackConfig,
    context: ContextProvider,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = app(config, context)?;
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|e| {
            SitepackError::Configuration(format!(
                "Failed to bind {}: {e}",
                config.server.bind_address
            ))
        })?;

    tracing::info!(
        address = %config.server.bind_address,
        role = %config.application.role,
        export_path = %config.server.export_path,
        "Sitepack server listening"
    );

    run(listener, app, shutdown).await
}

/// Serve `app` on an already bound listener until `shutdown` turns true
///
/// In-flight requests are allowed to finish after the signal.
pub async fn run(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if shutdown.wait_for(|stop| *stop).await.is_err() {
                // Sender dropped without a signal; keep serving
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received, draining connections");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
