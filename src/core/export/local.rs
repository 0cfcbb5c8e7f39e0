//! Local build strategy for the origin role

use super::orchestrator::{log_state, ExportState};
use super::report::ExportReport;
use super::strategy::{ExportArtifact, ExportStrategy};
use crate::config::{BuildConfig, ContextProvider, SitepackConfig};
use crate::core::archive::Archiver;
use crate::core::build::BuildExecutor;
use crate::core::lease::{ExportLease, LeaseGuard, LeasePolicy};
use crate::core::verification::OutputVerifier;
use crate::domain::{Archive, ExportRequest, Result, SitepackError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Builds, verifies and archives on this host under the export lease
///
/// The pipeline runs in a spawned task that owns the lease guard. A caller
/// that goes away does not cancel the build; the task finishes, its result is
/// discarded and the lease is released.
#[derive(Clone)]
pub struct LocalBuilder {
    pipeline: Arc<LocalPipeline>,
    lease: ExportLease,
}

struct LocalPipeline {
    build: BuildConfig,
    executor: BuildExecutor,
    archiver: Archiver,
    context: ContextProvider,
}

impl LocalBuilder {
    /// Create a local builder
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a build error pattern does not compile.
    pub fn new(
        build: BuildConfig,
        archiver: Archiver,
        lease: ExportLease,
        context: ContextProvider,
    ) -> Result<Self> {
        let executor = BuildExecutor::from_config(&build)?;
        Ok(Self {
            pipeline: Arc::new(LocalPipeline {
                build,
                executor,
                archiver,
                context,
            }),
            lease,
        })
    }

    /// Create a local builder from the full configuration
    pub fn from_config(config: &SitepackConfig, context: ContextProvider) -> Result<Self> {
        Self::new(
            config.build.clone(),
            Archiver::from_config(&config.archive),
            ExportLease::new(LeasePolicy::from_config(&config.lease)),
            context,
        )
    }

    pub fn lease(&self) -> &ExportLease {
        &self.lease
    }

    /// Run one export: acquire the lease, then build, verify and archive
    ///
    /// # Errors
    ///
    /// - [`SitepackError::LeaseBusy`] when the lease policy gives up
    /// - [`SitepackError::Build`], [`SitepackError::Verification`] or
    ///   [`SitepackError::Archive`] from the pipeline stage that failed
    pub async fn run(&self, export_id: Uuid) -> Result<(Archive, ExportReport)> {
        let guard = self.acquire(export_id).await?;

        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            pipeline.run(export_id).await
        });

        task.await
            .map_err(|e| SitepackError::Io(format!("export task failed: {e}")))?
    }

    /// Run one export in the calling task
    ///
    /// Unlike [`run`](Self::run), dropping the returned future cancels the
    /// export: the build's processes are killed and the lease is released.
    pub async fn run_attached(&self, export_id: Uuid) -> Result<(Archive, ExportReport)> {
        let _guard = self.acquire(export_id).await?;
        self.pipeline.run(export_id).await
    }

    async fn acquire(&self, export_id: Uuid) -> Result<LeaseGuard> {
        if self.lease.is_held() {
            tracing::info!(
                export_id = %export_id,
                policy = ?self.lease.policy(),
                "Export already in progress, applying lease policy"
            );
        }
        self.lease.acquire().await
    }
}

impl LocalPipeline {
    async fn run(&self, export_id: Uuid) -> Result<(Archive, ExportReport)> {
        let context = (self.context)();
        let command = self.build.command_for(context.containerized);
        let working_dir = PathBuf::from(&self.build.working_dir);
        let report = ExportReport::new(export_id, command, context.containerized);

        log_state(export_id, ExportState::Building);
        crate::log_export_start!(export_id, command);
        let build_start = Instant::now();
        let outcome = self
            .executor
            .execute(command, &working_dir, &self.build.resolved_env())
            .await;
        let report = report.with_build_duration(build_start.elapsed());
        outcome.into_result(self.executor.timeout().as_secs())?;

        let output = self.build.output_path();
        let verified = tokio::task::spawn_blocking(move || OutputVerifier::verify(&output))
            .await
            .map_err(|e| SitepackError::Io(format!("verification task failed: {e}")))??;

        log_state(export_id, ExportState::Archiving);
        let archive_start = Instant::now();
        let archive = self.archiver.archive(&verified.path).await?;
        let report = report.with_archive(&archive, archive_start.elapsed());

        Ok((archive, report))
    }
}

#[async_trait]
impl ExportStrategy for LocalBuilder {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn produce(&self, request: &ExportRequest) -> Result<ExportArtifact> {
        let (archive, report) = self.run(request.export_id).await?;
        report.log_summary();
        Ok(ExportArtifact::Archive(archive))
    }
}
