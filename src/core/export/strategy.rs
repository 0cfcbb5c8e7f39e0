//! Export strategies
//!
//! An instance produces archives in exactly one way, fixed by its role:
//! [`LocalBuilder`](super::LocalBuilder) builds on this host and
//! [`RemoteForwarder`](super::RemoteForwarder) relays from a downstream builder.

use crate::adapters::forward::RelayedArchive;
use crate::domain::{Archive, ExportRequest, Result};
use async_trait::async_trait;

/// What a successful export hands to the HTTP layer
#[derive(Debug)]
pub enum ExportArtifact {
    /// Archive built on this host
    Archive(Archive),
    /// Archive streamed from a downstream builder
    Relayed(RelayedArchive),
}

/// Produces the archive for one export request
#[async_trait]
pub trait ExportStrategy: Send + Sync {
    /// Short name used in logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn produce(&self, request: &ExportRequest) -> Result<ExportArtifact>;
}
