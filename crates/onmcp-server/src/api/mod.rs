mod agency;
mod crm_locations;
mod mcp;
mod proxy;
mod stats;
mod sync_logs;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use onmcp_core::{AppConfig, Catalog};
use onmcp_crm::CrmClient;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};
use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub crm: Arc<CrmClient>,
    pub upstream: UpstreamClient,
    pub catalog: Arc<Catalog>,
    pub config: Arc<AppConfig>,
}

/// Error response rendered as a flat `{ "error": "..." }` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(req_id: &RequestId, error: &onmcp_db::DbError) -> ApiError {
    tracing::error!(request_id = %req_id.0, error = %error, "database query failed");
    ApiError::internal(error.to_string())
}

pub(super) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn crm_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/crm/agency",
            get(agency::get_agency).post(agency::save_agency),
        )
        .route(
            "/api/crm/locations",
            get(crm_locations::list_locations).post(crm_locations::sync_locations),
        )
        .route("/api/crm/sync-logs", get(sync_logs::list_sync_logs))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(proxy::health))
        .route("/api/execute", post(proxy::execute))
        .route("/api/mcp/status", get(mcp::status))
        .route("/api/stats", get(stats::stats));

    Router::new()
        .merge(public_routes)
        .merge(crm_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}
