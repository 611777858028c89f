use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use onmcp_core::{AgencyStatus, CrmConfig};
use onmcp_crm::CrmHealth;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

const PIT_PREVIEW_CHARS: usize = 8;

#[derive(Debug, Serialize)]
pub(super) struct AgencyConfigItem {
    agency_name: String,
    agency_id: Option<String>,
    api_base_url: Option<String>,
    api_version: Option<String>,
    status: AgencyStatus,
    last_sync_at: Option<DateTime<Utc>>,
    location_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<onmcp_db::AgencyConfigRow> for AgencyConfigItem {
    fn from(row: onmcp_db::AgencyConfigRow) -> Self {
        Self {
            agency_name: row.agency_name,
            agency_id: row.agency_id,
            api_base_url: row.api_base_url,
            api_version: row.api_version,
            status: row.status,
            last_sync_at: row.last_sync_at,
            location_count: row.location_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Which CRM credentials are present. Secrets are never echoed.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct CredentialPresence {
    agency_api_key: bool,
    pit_key: bool,
    client_id: bool,
    client_secret: bool,
    pit_value: Option<String>,
}

impl CredentialPresence {
    fn from_config(config: &CrmConfig) -> Self {
        Self {
            agency_api_key: config.agency_api_key.is_some(),
            pit_key: config.pit_key.is_some(),
            client_id: config.client_id.is_some(),
            client_secret: config.client_secret.is_some(),
            pit_value: config.pit_key.as_deref().map(preview),
        }
    }
}

fn preview(secret: &str) -> String {
    let head: String = secret.chars().take(PIT_PREVIEW_CHARS).collect();
    format!("{head}...")
}

#[derive(Debug, Serialize)]
pub(super) struct AgencyView {
    config: Option<AgencyConfigItem>,
    keys: CredentialPresence,
    configured: bool,
}

pub(super) async fn get_agency(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<AgencyView>, ApiError> {
    let row = onmcp_db::get_agency_config(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id, &e))?;

    Ok(Json(AgencyView {
        config: row.map(AgencyConfigItem::from),
        keys: CredentialPresence::from_config(&state.config.crm),
        configured: state.config.crm.is_configured(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AgencyConfigBody {
    agency_name: Option<String>,
    agency_id: Option<String>,
    api_base_url: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AgencySaved {
    success: bool,
    config: AgencyConfigItem,
    health: CrmHealth,
}

impl AgencyConfigBody {
    /// Every field is optional, so an empty body is an empty update.
    fn parse(raw: &[u8]) -> Result<Self, ApiError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(raw).map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
        })
    }
}

/// Upsert the agency row, then probe the CRM with the stored agency id.
pub(super) async fn save_agency(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    raw: Bytes,
) -> Result<Json<AgencySaved>, ApiError> {
    let body = AgencyConfigBody::parse(&raw)?;
    let update = onmcp_db::AgencyConfigUpdate {
        agency_name: body.agency_name,
        agency_id: body.agency_id,
        api_base_url: body.api_base_url,
        api_version: body.api_version,
    };
    let row = onmcp_db::upsert_agency_config(&state.pool, &update)
        .await
        .map_err(|e| map_db_error(&req_id, &e))?;

    let health = state.crm.health(row.agency_id.as_deref()).await;
    if !health.ok {
        tracing::warn!(
            request_id = %req_id.0,
            status = health.status,
            error = ?health.error,
            "crm health probe failed after agency save"
        );
    }

    Ok(Json(AgencySaved {
        success: true,
        config: AgencyConfigItem::from(row),
        health,
    }))
}
