// Handlers: banner, version, metrics, trace upload/list

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use bytes::Bytes;

use super::AppState;
use crate::models::TraceRecord;
use crate::version::{NAME, VERSION};

/// GET /: plain text pointer to the metrics path.
pub(super) async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    format!(
        "{} {}\nmetrics at {}\n",
        NAME, VERSION, state.config.server.metrics_path
    )
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub(super) async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.exporter.render().await {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, operation = "render_metrics", "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /trace: one JSON trace from a job-side tracer.
pub(super) async fn upload_trace_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(store) = state.traces else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let trace: TraceRecord = match serde_json::from_slice(&body) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, operation = "upload_trace", "unable to decode trace");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    match store.add(trace) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "upload_trace", "rejected trace");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// GET /trace: live traces ordered by job id.
pub(super) async fn list_traces_handler(State(state): State<AppState>) -> Response {
    let Some(store) = state.traces else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut traces: Vec<TraceRecord> = store.fetch().into_values().collect();
    traces.sort_by_key(|t| t.job_id);
    axum::Json(traces).into_response()
}
