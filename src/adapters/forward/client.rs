//! HTTP client for the downstream builder

use super::target::{resolve_target, ForwardTarget};
use crate::config::{ContextProvider, ForwardConfig};
use crate::domain::{ExportRequest, ForwardError};
use axum::body::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::fmt;
use std::time::Duration;

/// Archive produced by a downstream builder, still in flight
pub struct RelayedArchive {
    /// Downstream `Content-Length`, when it sent one
    pub content_length: Option<u64>,
    /// Downstream body bytes, unmodified
    pub stream: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

impl fmt::Debug for RelayedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayedArchive")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Forwards export requests to a downstream builder
///
/// The target is resolved from the deployment context on every call, so a
/// change of `DOCKER_ENV` or `CLIENT_API_URL` takes effect without a restart.
///
/// # Example
///
/// ```no_run
/// use sitepack::adapters::forward::Forwarder;
/// use sitepack::config::deployment::env_provider;
/// use sitepack::config::ForwardConfig;
/// use sitepack::domain::{ExportMethod, ExportRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let forwarder = Forwarder::new(ForwardConfig::default(), "x-api-key", env_provider())?;
/// let relayed = forwarder
///     .forward(&ExportRequest::new(ExportMethod::Post).with_api_key("admin-key"))
///     .await?;
/// println!("{:?}", relayed.content_length);
/// # Ok(())
/// # }
/// ```
pub struct Forwarder {
    client: Client,
    config: ForwardConfig,
    api_key_header: String,
    context: ContextProvider,
}

impl Forwarder {
    /// Create a forwarder
    ///
    /// `api_key_header` names the inbound header that is passed downstream.
    pub fn new(
        config: ForwardConfig,
        api_key_header: impl Into<String>,
        context: ContextProvider,
    ) -> Result<Self, ForwardError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ForwardError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key_header: api_key_header.into(),
            context,
        })
    }

    /// Resolve the downstream endpoint for the current deployment context
    pub fn target(&self) -> Result<ForwardTarget, ForwardError> {
        resolve_target(&self.config, &(self.context)())
    }

    /// Send the export request downstream and return its archive stream
    ///
    /// Only the API key header is propagated, and only when the inbound
    /// request carried one.
    ///
    /// # Errors
    ///
    /// - [`ForwardError::Downstream`] with the downstream status and body text
    ///   when it answered with a non-success status
    /// - [`ForwardError::Unreachable`] when no response headers were received
    /// - [`ForwardError::InvalidTarget`] when the resolved URL is unusable
    pub async fn forward(&self, request: &ExportRequest) -> Result<RelayedArchive, ForwardError> {
        let target = self.target()?;
        tracing::info!(
            export_id = %request.export_id,
            target = %target,
            "Forwarding export request downstream"
        );

        let mut builder = self
            .client
            .post(target.url().clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(ref key) = request.api_key {
            builder = builder.header(self.api_key_header.as_str(), key.expose_secret().as_str());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(
                export_id = %request.export_id,
                target = %target,
                error = %e,
                "Downstream builder unreachable"
            );
            ForwardError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read downstream body: {e}"));
            tracing::error!(
                export_id = %request.export_id,
                status = status.as_u16(),
                body = %body,
                "Downstream builder returned an error"
            );
            return Err(ForwardError::Downstream {
                status: status.as_u16(),
                body,
            });
        }

        let content_length = response.content_length();
        tracing::info!(
            export_id = %request.export_id,
            bytes = content_length,
            "Relaying downstream archive"
        );

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            .boxed();

        Ok(RelayedArchive {
            content_length,
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::deployment::fixed_provider;
    use crate::config::DeploymentContext;
    use crate::domain::ExportMethod;

    async fn collect(relayed: RelayedArchive) -> Vec<u8> {
        relayed
            .stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    fn forwarder_for(url: String) -> Forwarder {
        Forwarder::new(
            ForwardConfig::default(),
            "x-api-key",
            fixed_provider(DeploymentContext::new(false, Some(url))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_forward_success_relays_body_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/static-export")
            .match_header("x-api-key", "admin-key")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/zip")
            .with_body(b"PK\x05\x06zipbytes")
            .create_async()
            .await;

        let forwarder = forwarder_for(server.url());
        let request = ExportRequest::new(ExportMethod::Get).with_api_key("admin-key");
        let relayed = forwarder.forward(&request).await.unwrap();

        assert_eq!(relayed.content_length, Some(12));
        assert_eq!(collect(relayed).await, b"PK\x05\x06zipbytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_without_key_sends_no_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/static-export")
            .match_header("x-api-key", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("zip")
            .create_async()
            .await;

        let forwarder = forwarder_for(server.url());
        let relayed = forwarder
            .forward(&ExportRequest::new(ExportMethod::Post))
            .await
            .unwrap();
        assert_eq!(collect(relayed).await, b"zip");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_downstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/static-export")
            .with_status(503)
            .with_body(r#"{"error":"disk full"}"#)
            .create_async()
            .await;

        let forwarder = forwarder_for(server.url());
        match forwarder.forward(&ExportRequest::new(ExportMethod::Post)).await {
            Err(ForwardError::Downstream { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("disk full"));
            }
            other => panic!("Expected downstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forward_unreachable() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let forwarder = forwarder_for("http://127.0.0.1:9".to_string());
        let result = forwarder.forward(&ExportRequest::new(ExportMethod::Post)).await;
        assert!(matches!(result, Err(ForwardError::Unreachable(_))));
    }

    #[test]
    fn test_target_follows_context() {
        let forwarder = Forwarder::new(
            ForwardConfig::default(),
            "x-api-key",
            fixed_provider(DeploymentContext::new(true, None)),
        )
        .unwrap();
        assert_eq!(
            forwarder.target().unwrap().as_str(),
            "http://client:3000/api/static-export"
        );
    }
}
