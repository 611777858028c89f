use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use onmcp_sync::SyncOptions;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct LocationItem {
    id: i64,
    external_id: String,
    name: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    timezone: Option<String>,
    logo_url: Option<String>,
    metadata: serde_json::Value,
    last_synced_at: DateTime<Utc>,
    removed_upstream_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationList {
    locations: Vec<LocationItem>,
    count: usize,
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<LocationList>, ApiError> {
    let rows = onmcp_db::list_crm_locations(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id, &e))?;

    let locations: Vec<LocationItem> = rows
        .into_iter()
        .map(|row| LocationItem {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            phone: row.phone,
            email: row.email,
            website: row.website,
            timezone: row.timezone,
            logo_url: row.logo_url,
            metadata: row.metadata,
            last_synced_at: row.last_synced_at,
            removed_upstream_at: row.removed_upstream_at,
        })
        .collect();

    Ok(Json(LocationList {
        count: locations.len(),
        locations,
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct SyncResult {
    success: bool,
    total: u64,
    added: u64,
    updated: u64,
    deactivated: u64,
    duration_ms: u64,
}

/// Run a full sync inside the request. There is no overall time budget.
pub(super) async fn sync_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<SyncResult>, ApiError> {
    tracing::info!(request_id = %req_id.0, "manual crm sync requested");

    let options = SyncOptions::from_app_config(&state.config);
    let summary = onmcp_sync::run_full_sync(&state.pool, &state.crm, &options)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %req_id.0, error = %e, "manual crm sync failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(SyncResult {
        success: true,
        total: summary.total,
        added: summary.added,
        updated: summary.updated,
        deactivated: summary.deactivated,
        duration_ms: summary.duration_ms,
    }))
}
