//! End-to-end tests for the edge role
//!
//! A mockito server stands in for the downstream origin.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use sitepack::config::deployment::fixed_provider;
use sitepack::config::{DeploymentContext, Role, SitepackConfig};
use sitepack::server;
use tower::ServiceExt;

const ORIGIN: &str = "https://admin.example.test";

fn edge_app(downstream: &str) -> Router {
    let mut config = SitepackConfig::default();
    config.application.role = Role::Edge;
    config.forward.timeout_secs = 5;
    let context = DeploymentContext::new(false, Some(downstream.to_string()));
    server::app(&config, fixed_provider(context)).unwrap()
}

fn export_request(api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/export")
        .header("origin", ORIGIN);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_downstream_error_is_relayed() {
    let mut downstream = mockito::Server::new_async().await;
    let mock = downstream
        .mock("POST", "/api/static-export")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"disk full"}"#)
        .create_async()
        .await;

    let response = edge_app(&downstream.url())
        .oneshot(export_request(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["access-control-allow-origin"], ORIGIN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("disk full"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_archive_is_streamed_with_own_headers() {
    let mut downstream = mockito::Server::new_async().await;
    let mock = downstream
        .mock("POST", "/api/static-export")
        .match_header("x-api-key", "admin-key")
        .match_header("origin", mockito::Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/zip")
        .with_header("access-control-allow-origin", "*")
        .with_body(b"PK\x05\x06relayed-zip")
        .create_async()
        .await;

    let response = edge_app(&downstream.url())
        .oneshot(export_request(Some("admin-key")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["access-control-allow-origin"], ORIGIN);
    assert_eq!(headers["content-type"], "application/zip");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=static_export.zip"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"PK\x05\x06relayed-zip");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_preflight_is_not_forwarded() {
    let mut downstream = mockito::Server::new_async().await;
    let mock = downstream
        .mock("POST", "/api/static-export")
        .expect(0)
        .create_async()
        .await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/export")
        .header("origin", ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = edge_app(&downstream.url()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-origin"], ORIGIN);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_downstream_is_bad_gateway() {
    let response = edge_app("http://127.0.0.1:9")
        .oneshot(export_request(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()["access-control-allow-origin"], ORIGIN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Static export failed");
}

#[tokio::test]
async fn test_health_reports_edge_role() {
    let response = edge_app("http://127.0.0.1:9")
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["role"], "edge");
    assert_eq!(json["strategy"], "forward");
}
