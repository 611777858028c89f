use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use onmcp_core::{CatalogService, CatalogStats, CategorySummary};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    badge: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatsBody<'a> {
    stats: CatalogStats,
    services: &'a [CatalogService],
    categories: Vec<CategorySummary>,
}

/// Catalog stats, or a single shields.io badge when `?badge=` is given.
pub(super) async fn stats(State(state): State<AppState>, Query(query): Query<StatsQuery>) -> Response {
    if let Some(key) = query.badge.as_deref() {
        return match state.catalog.badge(key) {
            Some(badge) => Json(badge).into_response(),
            None => ApiError::new(StatusCode::NOT_FOUND, format!("unknown badge: {key}"))
                .into_response(),
        };
    }

    Json(StatsBody {
        stats: state.catalog.stats(),
        services: state.catalog.services(),
        categories: state.catalog.categories(),
    })
    .into_response()
}
