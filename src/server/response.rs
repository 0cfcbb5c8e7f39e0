//! HTTP response assembly
//!
//! Every response leaving the export endpoint carries the CORS header set,
//! whether it is an archive, a relayed archive, a preflight answer or an error.
//! The allowed origin is the caller's `Origin` echoed back, or empty. It is
//! never `*`.

use super::ResponseSettings;
use crate::adapters::forward::RelayedArchive;
use crate::core::export::{ExportArtifact, ExportFailure, ExportResponse};
use crate::domain::{Archive, ArchivePayload};
use axum::body::{Body, Bytes};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, VARY,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tempfile::TempPath;
use tokio::io::AsyncReadExt;

/// Header carrying the hex SHA-256 of a locally built archive
pub const ARCHIVE_SHA256_HEADER: &str = "x-archive-sha256";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ZIP_CONTENT_TYPE: &str = "application/zip";
const STREAM_CHUNK: usize = 64 * 1024;

/// CORS headers for a response to `origin`
pub fn cors_headers(origin: &str, api_key_header: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    let allowed = format!("Content-Type, Authorization, {api_key_header}");
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_str(&allowed)
            .unwrap_or_else(|_| HeaderValue::from_static("Content-Type, Authorization")),
    );
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers
}

/// `204 No Content` answer to a CORS preflight
pub fn preflight(origin: &str, settings: &ResponseSettings) -> Response {
    (
        StatusCode::NO_CONTENT,
        cors_headers(origin, &settings.api_key_header),
    )
        .into_response()
}

/// `200 OK` carrying a locally built archive
pub fn archive_response(archive: Archive, origin: &str, settings: &ResponseSettings) -> Response {
    let mut headers = download_headers(origin, settings, Some(archive.size()));
    if let Ok(value) = HeaderValue::from_str(&archive.sha256) {
        headers.insert(HeaderName::from_static(ARCHIVE_SHA256_HEADER), value);
    }

    let body = match archive.payload {
        ArchivePayload::InMemory(bytes) => Body::from(bytes),
        ArchivePayload::TempFile { path, .. } => temp_file_body(path),
    };

    (StatusCode::OK, headers, body).into_response()
}

/// `200 OK` streaming an archive received from a downstream builder
///
/// Downstream headers are not copied; this service sets its own.
pub fn relay_response(
    relayed: RelayedArchive,
    origin: &str,
    settings: &ResponseSettings,
) -> Response {
    let headers = download_headers(origin, settings, relayed.content_length);
    (StatusCode::OK, headers, Body::from_stream(relayed.stream)).into_response()
}

/// JSON error body `{"error": ..., "details": ...}` with CORS headers
pub fn error_response(failure: &ExportFailure, origin: &str, settings: &ResponseSettings) -> Response {
    let status =
        StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        cors_headers(origin, &settings.api_key_header),
        Json(json!({
            "error": failure.error,
            "details": failure.details,
        })),
    )
        .into_response()
}

/// Turn an orchestrator result into the HTTP response
pub fn render(response: ExportResponse, origin: &str, settings: &ResponseSettings) -> Response {
    match response {
        ExportResponse::Preflight => preflight(origin, settings),
        ExportResponse::Artifact(ExportArtifact::Archive(archive)) => {
            archive_response(archive, origin, settings)
        }
        ExportResponse::Artifact(ExportArtifact::Relayed(relayed)) => {
            relay_response(relayed, origin, settings)
        }
        ExportResponse::Failed(failure) => error_response(&failure, origin, settings),
    }
}

fn download_headers(
    origin: &str,
    settings: &ResponseSettings,
    content_length: Option<u64>,
) -> HeaderMap {
    let mut headers = cors_headers(origin, &settings.api_key_header);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(ZIP_CONTENT_TYPE));
    let disposition = format!("attachment; filename={}", settings.filename);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    if let Some(len) = content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    headers
}

/// Stream a temp-file archive; the file is removed when the body is dropped
///
/// The stream owns the [`TempPath`], so deletion happens after the last chunk
/// is sent, when the client disconnects, or when a read fails.
fn temp_file_body(path: TempPath) -> Body {
    let stream = async_stream::stream! {
        match tokio::fs::File::open(&path).await {
            Ok(mut file) => {
                let mut buf = vec![0u8; STREAM_CHUNK];
                loop {
                    match file.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => yield Ok::<Bytes, std::io::Error>(Bytes::copy_from_slice(&buf[..n])),
                        Err(e) => {
                            tracing::error!(path = %path.display(), error = %e, "Failed to stream archive");
                            yield Err(e);
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to open archive");
                yield Err(e);
            }
        }
        tracing::debug!(path = %path.display(), "Archive stream finished");
    };
    Body::from_stream(stream)
}
