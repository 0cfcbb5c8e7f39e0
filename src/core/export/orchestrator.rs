//! Export orchestrator - top-level coordinator for export requests
//!
//! Each request moves through
//! `Received → (Forwarding | Building → Archiving) → Responding → Done`,
//! or into `Failed` from any non-terminal state. Every failure is turned into
//! an [`ExportFailure`] here, so nothing escapes to the HTTP layer as an
//! opaque error.

use super::local::LocalBuilder;
use super::remote::RemoteForwarder;
use super::strategy::{ExportArtifact, ExportStrategy};
use crate::config::{ContextProvider, Role, SitepackConfig};
use crate::domain::{ExportRequest, ForwardError, Result, SitepackError, VerificationError};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Summary for build, verification and archive failures
pub const EXPORT_FAILED: &str = "Static export failed";

/// Summary when the build left no output directory
pub const OUTPUT_DIR_NOT_FOUND: &str = "Static export failed - output directory not found";

/// Summary when another export holds the lease
pub const EXPORT_IN_PROGRESS: &str = "Static export already in progress";

/// Per-request export state, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Received,
    Forwarding,
    Building,
    Archiving,
    Responding,
    Done,
    Failed,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportState::Received => "received",
            ExportState::Forwarding => "forwarding",
            ExportState::Building => "building",
            ExportState::Archiving => "archiving",
            ExportState::Responding => "responding",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

pub(crate) fn log_state(export_id: Uuid, state: ExportState) {
    tracing::debug!(export_id = %export_id, state = %state, "Export state");
}

/// Error response contents for a failed export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    /// HTTP status code
    pub status: u16,
    /// Short summary
    pub error: String,
    /// Diagnostic text (build output, downstream body or I/O error)
    pub details: String,
}

impl ExportFailure {
    fn new(status: u16, error: &str, details: impl Into<String>) -> Self {
        Self {
            status,
            error: error.to_string(),
            details: details.into(),
        }
    }
}

impl From<&SitepackError> for ExportFailure {
    fn from(error: &SitepackError) -> Self {
        match error {
            SitepackError::Build(e) => Self::new(500, EXPORT_FAILED, e.diagnostics()),
            SitepackError::Verification(e @ VerificationError::NotFound(_)) => {
                Self::new(500, OUTPUT_DIR_NOT_FOUND, e.to_string())
            }
            SitepackError::Verification(e) => Self::new(500, EXPORT_FAILED, e.to_string()),
            SitepackError::Archive(e) => Self::new(500, EXPORT_FAILED, e.to_string()),
            SitepackError::Forward(ForwardError::Downstream { status, body }) => {
                let status = if (400..=599).contains(status) { *status } else { 502 };
                Self::new(status, EXPORT_FAILED, body.clone())
            }
            SitepackError::Forward(e) => Self::new(502, EXPORT_FAILED, e.to_string()),
            SitepackError::LeaseBusy => Self::new(409, EXPORT_IN_PROGRESS, error.to_string()),
            SitepackError::Configuration(_)
            | SitepackError::Serialization(_)
            | SitepackError::Io(_) => Self::new(500, EXPORT_FAILED, error.to_string()),
        }
    }
}

/// Outcome of [`ExportOrchestrator::handle`]
#[derive(Debug)]
pub enum ExportResponse {
    /// CORS preflight; no export was started
    Preflight,
    /// Archive ready to send
    Artifact(ExportArtifact),
    /// Export failed
    Failed(ExportFailure),
}

/// Export orchestrator
///
/// Holds the strategy chosen for this instance's role. The strategy never
/// changes after construction.
#[derive(Clone)]
pub struct ExportOrchestrator {
    strategy: Arc<dyn ExportStrategy>,
}

impl ExportOrchestrator {
    pub fn new(strategy: Arc<dyn ExportStrategy>) -> Self {
        Self { strategy }
    }

    /// Create an orchestrator whose strategy matches `application.role`
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot be constructed from the configuration.
    pub fn from_config(config: &SitepackConfig, context: ContextProvider) -> Result<Self> {
        let strategy: Arc<dyn ExportStrategy> = match config.application.role {
            Role::Origin => Arc::new(LocalBuilder::from_config(config, context)?),
            Role::Edge => Arc::new(RemoteForwarder::from_config(config, context)?),
        };
        tracing::info!(
            role = %config.application.role,
            strategy = strategy.name(),
            "Export orchestrator ready"
        );
        Ok(Self::new(strategy))
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Handle one export request
    pub async fn handle(&self, request: &ExportRequest) -> ExportResponse {
        log_state(request.export_id, ExportState::Received);

        if request.method.is_preflight() {
            tracing::debug!(export_id = %request.export_id, "Answering preflight request");
            return ExportResponse::Preflight;
        }

        tracing::info!(
            export_id = %request.export_id,
            method = %request.method,
            strategy = self.strategy.name(),
            "Export requested"
        );

        let start = Instant::now();
        match self.strategy.produce(request).await {
            Ok(artifact) => {
                log_state(request.export_id, ExportState::Responding);
                tracing::info!(
                    export_id = %request.export_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Export ready"
                );
                ExportResponse::Artifact(artifact)
            }
            Err(error) => {
                log_state(request.export_id, ExportState::Failed);
                crate::log_error_with_context!(&error, "Static export failed");
                let failure = ExportFailure::from(&error);
                tracing::warn!(
                    export_id = %request.export_id,
                    status = failure.status,
                    error = %failure.error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Export failed"
                );
                ExportResponse::Failed(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArchiveError, BuildError, ExportMethod, FailureReason};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStrategy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExportStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn produce(&self, _request: &ExportRequest) -> Result<ExportArtifact> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SitepackError::LeaseBusy)
        }
    }

    #[tokio::test]
    async fn test_preflight_skips_strategy() {
        let strategy = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = ExportOrchestrator::new(strategy.clone());

        let response = orchestrator
            .handle(&ExportRequest::new(ExportMethod::Options))
            .await;
        assert!(matches!(response, ExportResponse::Preflight));
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_mapped() {
        let strategy = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = ExportOrchestrator::new(strategy.clone());

        match orchestrator.handle(&ExportRequest::new(ExportMethod::Get)).await {
            ExportResponse::Failed(failure) => {
                assert_eq!(failure.status, 409);
                assert_eq!(failure.error, EXPORT_IN_PROGRESS);
            }
            other => panic!("Expected failure, got {other:?}"),
        }
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_failure_mapping() {
        let error = SitepackError::Build(BuildError::Failed {
            reason: FailureReason::ExitStatus(Some(1)),
            stdout: String::new(),
            stderr: "module not found".to_string(),
        });
        let failure = ExportFailure::from(&error);
        assert_eq!(failure.status, 500);
        assert_eq!(failure.error, EXPORT_FAILED);
        assert!(failure.details.starts_with("build command exited with error"));
        assert!(failure.details.ends_with("module not found"));
    }

    #[test]
    fn test_missing_output_mapping() {
        let error = SitepackError::Verification(VerificationError::NotFound("/app/out".to_string()));
        let failure = ExportFailure::from(&error);
        assert_eq!(failure.status, 500);
        assert_eq!(failure.error, OUTPUT_DIR_NOT_FOUND);
        assert!(failure.details.contains("/app/out"));
    }

    #[test]
    fn test_downstream_status_is_kept() {
        let error = SitepackError::Forward(ForwardError::Downstream {
            status: 503,
            body: r#"{"error":"disk full"}"#.to_string(),
        });
        let failure = ExportFailure::from(&error);
        assert_eq!(failure.status, 503);
        assert!(failure.details.contains("disk full"));
    }

    #[test]
    fn test_unreachable_is_bad_gateway() {
        let error = SitepackError::Forward(ForwardError::Unreachable("refused".to_string()));
        assert_eq!(ExportFailure::from(&error).status, 502);
    }

    #[test]
    fn test_archive_failure_mapping() {
        let error = SitepackError::Archive(ArchiveError::Io {
            path: "/app/out/a.html".to_string(),
            message: "permission denied".to_string(),
        });
        let failure = ExportFailure::from(&error);
        assert_eq!(failure.status, 500);
        assert!(failure.details.contains("permission denied"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ExportState::Forwarding.to_string(), "forwarding");
        assert_eq!(ExportState::Done.to_string(), "done");
    }
}
