//! Router and request handlers

use super::response::{error_response, render};
use super::AppState;
use crate::config::{api_key_from_header, ServerConfig};
use crate::core::export::orchestrator::{log_state, ExportState};
use crate::core::export::{ExportFailure, EXPORT_FAILED};
use crate::domain::{ExportMethod, ExportRequest};
use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, MethodRouter};
use axum::{Json, Router};
use serde_json::json;

/// Build the application router
///
/// The export handler answers every method on the export path and on the
/// legacy alias when one is configured. Methods other than `GET`, `POST` and
/// `OPTIONS` get a `405` JSON error with CORS headers.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route(&server.export_path, export_methods())
        .route("/health", get(health));

    if let Some(legacy) = server.legacy_route() {
        router = router.route(legacy, export_methods());
    }

    router.with_state(state)
}

fn export_methods() -> MethodRouter<AppState> {
    any(export)
}

async fn export(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    let origin = header_str(&headers, ORIGIN.as_str()).unwrap_or_default();

    let method = match method.as_str().parse::<ExportMethod>() {
        Ok(method) => method,
        Err(e) => {
            let failure = ExportFailure {
                status: 405,
                error: EXPORT_FAILED.to_string(),
                details: e,
            };
            return error_response(&failure, origin, &state.settings);
        }
    };

    let mut request = ExportRequest::new(method);
    if !origin.is_empty() {
        request = request.with_origin(origin);
    }
    request.api_key = api_key_from_header(header_str(&headers, &state.settings.api_key_header));

    let outcome = state.orchestrator.handle(&request).await;
    let response = render(outcome, origin, &state.settings);
    log_state(request.export_id, ExportState::Done);
    response
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "role": state.role.to_string(),
        "strategy": state.orchestrator.strategy_name(),
    }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
