//! Pass-through routes to the 0nMCP orchestrator.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::middleware::RequestId;

use super::{timestamp, AppState};

/// Upstream health, merged with `online` and `timestamp`.
///
/// Always answers 200; an unreachable upstream is reported in the body.
pub(super) async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    let body = match state.upstream.health().await {
        Ok(probe) => {
            let mut merged = Map::new();
            if let Value::Object(fields) = probe.body {
                merged.extend(fields);
            }
            merged.insert("online".to_string(), Value::Bool(true));
            merged.insert("timestamp".to_string(), Value::String(timestamp()));
            Value::Object(merged)
        }
        Err(e) => {
            tracing::warn!(request_id = %req_id.0, error = %e, "0nMCP health probe failed");
            json!({
                "online": false,
                "hint": format!(
                    "0nMCP is not reachable at {}. Start it with `npx 0nmcp serve` or set ONMCP_URL.",
                    state.upstream.base_url()
                ),
                "timestamp": timestamp(),
            })
        }
    };

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-cache")],
        Json(body),
    )
        .into_response()
}

/// Forward a task or tool invocation.
///
/// The body is read as raw bytes so a missing or malformed body gets the
/// same 400 as one naming neither `task` nor `tool`.
pub(super) async fn execute(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if !has_field(&request, "task") && !has_field(&request, "tool") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "task or tool required" })),
        )
            .into_response();
    }

    match state.upstream.execute(&request).await {
        Ok(upstream) => {
            let mut merged = match upstream {
                Value::Object(fields) => fields,
                other => {
                    let mut wrapped = Map::new();
                    wrapped.insert("result".to_string(), other);
                    wrapped
                }
            };
            merged.insert("source".to_string(), Value::String("0nmcp".to_string()));
            merged.insert("timestamp".to_string(), Value::String(timestamp()));
            Json(Value::Object(merged)).into_response()
        }
        Err(e) => {
            tracing::warn!(request_id = %req_id.0, error = %e, "0nMCP execute failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string(), "status": "offline" })),
            )
                .into_response()
        }
    }
}

fn has_field(request: &Value, key: &str) -> bool {
    match request.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
