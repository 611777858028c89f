//! Database operations for `crm_sync_logs`, the append-only audit trail of
//! sync runs.
//!
//! A row is created as `running` and finalized exactly once, as either
//! `completed` or `failed`. Both transitions are guarded in SQL on the
//! current status, so a finalized row can never be rewritten.

use chrono::{DateTime, Utc};
use onmcp_core::SyncLogStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{to_db_count, DbError};

const SELECT_COLUMNS: &str = "id, public_id, sync_type, status, total_synced, added, updated, \
     deactivated, duration_ms, error_message, started_at, completed_at";

/// A row from the `crm_sync_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncLogRow {
    pub id: i64,
    pub public_id: Uuid,
    pub sync_type: String,
    #[sqlx(try_from = "String")]
    pub status: SyncLogStatus,
    pub total_synced: i32,
    pub added: i32,
    pub updated: i32,
    pub deactivated: i32,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Final tallies written when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncLogCounts {
    pub total: u64,
    pub added: u64,
    pub updated: u64,
    pub deactivated: u64,
    pub duration_ms: u64,
}

/// Creates a new log entry in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_log(pool: &PgPool, sync_type: &str) -> Result<SyncLogRow, DbError> {
    let row = sqlx::query_as::<_, SyncLogRow>(&format!(
        "INSERT INTO crm_sync_logs (public_id, sync_type, status) \
         VALUES ($1, $2, $3) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(sync_type)
    .bind(SyncLogStatus::Running.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running entry `completed` with its final counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncLogTransition`] if the entry is not
/// `running`, [`DbError::CountOverflow`] if a count does not fit, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_log(
    pool: &PgPool,
    id: i64,
    counts: &SyncLogCounts,
) -> Result<(), DbError> {
    let duration_ms = i64::try_from(counts.duration_ms).unwrap_or(i64::MAX);

    let result = sqlx::query(
        "UPDATE crm_sync_logs \
         SET status = $1, total_synced = $2, added = $3, updated = $4, deactivated = $5, \
             duration_ms = $6, completed_at = NOW() \
         WHERE id = $7 AND status = $8",
    )
    .bind(SyncLogStatus::Completed.as_str())
    .bind(to_db_count("total_synced", counts.total)?)
    .bind(to_db_count("added", counts.added)?)
    .bind(to_db_count("updated", counts.updated)?)
    .bind(to_db_count("deactivated", counts.deactivated)?)
    .bind(duration_ms)
    .bind(id)
    .bind(SyncLogStatus::Running.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncLogTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running entry `failed` with the error text.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncLogTransition`] if the entry is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_log(
    pool: &PgPool,
    id: i64,
    error_message: &str,
    duration_ms: u64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE crm_sync_logs \
         SET status = $1, error_message = $2, duration_ms = $3, completed_at = NOW() \
         WHERE id = $4 AND status = $5",
    )
    .bind(SyncLogStatus::Failed.as_str())
    .bind(error_message)
    .bind(i64::try_from(duration_ms).unwrap_or(i64::MAX))
    .bind(id)
    .bind(SyncLogStatus::Running.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncLogTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single entry by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_sync_log(pool: &PgPool, id: i64) -> Result<SyncLogRow, DbError> {
    sqlx::query_as::<_, SyncLogRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM crm_sync_logs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` entries, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_logs(pool: &PgPool, limit: i64) -> Result<Vec<SyncLogRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncLogRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM crm_sync_logs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
