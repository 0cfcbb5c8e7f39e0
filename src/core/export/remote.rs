//! Forwarding strategy for the edge role

use super::orchestrator::{log_state, ExportState};
use super::strategy::{ExportArtifact, ExportStrategy};
use crate::adapters::forward::Forwarder;
use crate::config::{ContextProvider, SitepackConfig};
use crate::domain::{ExportRequest, Result};
use async_trait::async_trait;

/// Relays export requests to a downstream builder
///
/// Never takes the export lease: the downstream builder serializes its own builds.
pub struct RemoteForwarder {
    forwarder: Forwarder,
}

impl RemoteForwarder {
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }

    pub fn from_config(config: &SitepackConfig, context: ContextProvider) -> Result<Self> {
        let forwarder = Forwarder::new(
            config.forward.clone(),
            config.cors.api_key_header.clone(),
            context,
        )?;
        Ok(Self::new(forwarder))
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }
}

#[async_trait]
impl ExportStrategy for RemoteForwarder {
    fn name(&self) -> &'static str {
        "forward"
    }

    async fn produce(&self, request: &ExportRequest) -> Result<ExportArtifact> {
        log_state(request.export_id, ExportState::Forwarding);
        let relayed = self.forwarder.forward(request).await?;
        Ok(ExportArtifact::Relayed(relayed))
    }
}
