use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use onmcp_core::SyncLogStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SyncLogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncLogItem {
    sync_log_id: Uuid,
    sync_type: String,
    status: SyncLogStatus,
    total_synced: i32,
    added: i32,
    updated: i32,
    deactivated: i32,
    duration_ms: Option<i64>,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncLogList {
    logs: Vec<SyncLogItem>,
    count: usize,
}

pub(super) async fn list_sync_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SyncLogsQuery>,
) -> Result<Json<SyncLogList>, ApiError> {
    let rows = onmcp_db::list_sync_logs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(&req_id, &e))?;

    let logs: Vec<SyncLogItem> = rows
        .into_iter()
        .map(|row| SyncLogItem {
            sync_log_id: row.public_id,
            sync_type: row.sync_type,
            status: row.status,
            total_synced: row.total_synced,
            added: row.added,
            updated: row.updated,
            deactivated: row.deactivated,
            duration_ms: row.duration_ms,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
        .collect();

    Ok(Json(SyncLogList {
        count: logs.len(),
        logs,
    }))
}
