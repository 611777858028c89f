//! Database operations for the singleton `agency_config` row.
//!
//! The table holds at most one row, pinned to [`AGENCY_CONFIG_ID`]. Every
//! write is an `INSERT … ON CONFLICT (id)` so the first write of any kind
//! creates the row.

use chrono::{DateTime, Utc};
use onmcp_core::AgencyStatus;
use sqlx::PgPool;

use crate::{to_db_count, DbError};

pub const AGENCY_CONFIG_ID: i16 = 1;

const RETURNING_COLUMNS: &str = "id, agency_name, agency_id, api_base_url, api_version, status, \
     last_sync_at, location_count, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgencyConfigRow {
    pub id: i16,
    pub agency_name: String,
    pub agency_id: Option<String>,
    /// `None` means the process-wide `CRM_API_BASE` applies.
    pub api_base_url: Option<String>,
    pub api_version: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AgencyStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub location_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields submitted through the configuration endpoint. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AgencyConfigUpdate {
    pub agency_name: Option<String>,
    pub agency_id: Option<String>,
    pub api_base_url: Option<String>,
    pub api_version: Option<String>,
}

/// Fetch the singleton row, if it has been created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_agency_config(pool: &PgPool) -> Result<Option<AgencyConfigRow>, DbError> {
    let row = sqlx::query_as::<_, AgencyConfigRow>(&format!(
        "SELECT {RETURNING_COLUMNS} FROM agency_config WHERE id = $1"
    ))
    .bind(AGENCY_CONFIG_ID)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create or update the singleton from a configuration submission.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_agency_config(
    pool: &PgPool,
    update: &AgencyConfigUpdate,
) -> Result<AgencyConfigRow, DbError> {
    let row = sqlx::query_as::<_, AgencyConfigRow>(&format!(
        "INSERT INTO agency_config (id, agency_name, agency_id, api_base_url, api_version) \
         VALUES ($1, COALESCE($2, ''), $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET \
             agency_name  = COALESCE($2, agency_config.agency_name), \
             agency_id    = COALESCE($3, agency_config.agency_id), \
             api_base_url = COALESCE($4, agency_config.api_base_url), \
             api_version  = COALESCE($5, agency_config.api_version), \
             updated_at   = NOW() \
         RETURNING {RETURNING_COLUMNS}"
    ))
    .bind(AGENCY_CONFIG_ID)
    .bind(update.agency_name.as_deref())
    .bind(update.agency_id.as_deref())
    .bind(update.api_base_url.as_deref())
    .bind(update.api_version.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Set the connection status, creating the row if needed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_agency_status(pool: &PgPool, status: AgencyStatus) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO agency_config (id, status) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()",
    )
    .bind(AGENCY_CONFIG_ID)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a sync as finished: status `active`, `last_sync_at = NOW()` and the
/// number of locations the run processed.
///
/// # Errors
///
/// Returns [`DbError::CountOverflow`] if `location_count` exceeds the column
/// range, or [`DbError::Sqlx`] if the upsert fails.
pub async fn record_agency_sync(pool: &PgPool, location_count: u64) -> Result<(), DbError> {
    let location_count = to_db_count("location_count", location_count)?;

    sqlx::query(
        "INSERT INTO agency_config (id, status, last_sync_at, location_count) \
         VALUES ($1, $2, NOW(), $3) \
         ON CONFLICT (id) DO UPDATE SET \
             status         = EXCLUDED.status, \
             last_sync_at   = EXCLUDED.last_sync_at, \
             location_count = EXCLUDED.location_count, \
             updated_at     = NOW()",
    )
    .bind(AGENCY_CONFIG_ID)
    .bind(AgencyStatus::Active.as_str())
    .bind(location_count)
    .execute(pool)
    .await?;

    Ok(())
}
