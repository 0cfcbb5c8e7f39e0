//! Deployment context detection
//!
//! The deployment context decides which build command runs and where an edge
//! instance forwards to. It is read from the process environment on every
//! request, never cached, because the environment differs between deployments
//! of the same binary.

use std::sync::Arc;

/// Set to `true` when running under container orchestration
pub const DOCKER_ENV_VAR: &str = "DOCKER_ENV";

/// Explicit downstream base URL for non-container deployments
pub const CLIENT_API_URL_VAR: &str = "CLIENT_API_URL";

/// Snapshot of the deployment-related environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentContext {
    /// Running inside the container network
    pub containerized: bool,
    /// Downstream base URL override (ignored when containerized)
    pub downstream_override: Option<String>,
}

impl DeploymentContext {
    pub fn new(containerized: bool, downstream_override: Option<String>) -> Self {
        Self {
            containerized,
            downstream_override,
        }
    }

    /// Read the context from the process environment
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let containerized = lookup(DOCKER_ENV_VAR)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let downstream_override = lookup(CLIENT_API_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            containerized,
            downstream_override,
        }
    }
}

/// Source of the deployment context, queried once per request
pub type ContextProvider = Arc<dyn Fn() -> DeploymentContext + Send + Sync>;

/// Provider that reads the live process environment
pub fn env_provider() -> ContextProvider {
    Arc::new(DeploymentContext::detect)
}

/// Provider that always returns the same context
pub fn fixed_provider(context: DeploymentContext) -> ContextProvider {
    Arc::new(move || context.clone())
}
