//! Database operations for the `crm_locations` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const SELECT_COLUMNS: &str = "id, external_id, name, address, city, state, country, postal_code, \
     phone, email, website, timezone, logo_url, metadata, last_synced_at, removed_upstream_at, \
     created_at, updated_at";

/// A row from the `crm_locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrmLocationRow {
    pub id: i64,
    pub external_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub logo_url: Option<String>,
    pub metadata: serde_json::Value,
    pub last_synced_at: DateTime<Utc>,
    /// Set when the last full sync did not return this location.
    pub removed_upstream_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mapped fields of one CRM location, ready to be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLocation {
    pub external_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub logo_url: Option<String>,
    /// Raw provider payload, stored verbatim.
    pub metadata: serde_json::Value,
}

/// Insert a location, or overwrite every mapped field of the existing row
/// with the same `external_id`.
///
/// Fields that are `None` are written as `NULL` rather than preserved, so an
/// update is always a full replacement. The row's tombstone is cleared.
///
/// Returns `true` when the row was inserted, `false` when it was updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_crm_location(pool: &PgPool, location: &NewLocation) -> Result<bool, DbError> {
    let is_new = sqlx::query_scalar::<_, bool>(
        "INSERT INTO crm_locations \
             (external_id, name, address, city, state, country, postal_code, \
              phone, email, website, timezone, logo_url, metadata, last_synced_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW()) \
         ON CONFLICT (external_id) DO UPDATE SET \
             name                = EXCLUDED.name, \
             address             = EXCLUDED.address, \
             city                = EXCLUDED.city, \
             state               = EXCLUDED.state, \
             country             = EXCLUDED.country, \
             postal_code         = EXCLUDED.postal_code, \
             phone               = EXCLUDED.phone, \
             email               = EXCLUDED.email, \
             website             = EXCLUDED.website, \
             timezone            = EXCLUDED.timezone, \
             logo_url            = EXCLUDED.logo_url, \
             metadata            = EXCLUDED.metadata, \
             last_synced_at      = NOW(), \
             removed_upstream_at = NULL, \
             updated_at          = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&location.external_id)
    .bind(location.name.as_deref())
    .bind(location.address.as_deref())
    .bind(location.city.as_deref())
    .bind(location.state.as_deref())
    .bind(location.country.as_deref())
    .bind(location.postal_code.as_deref())
    .bind(location.phone.as_deref())
    .bind(location.email.as_deref())
    .bind(location.website.as_deref())
    .bind(location.timezone.as_deref())
    .bind(location.logo_url.as_deref())
    .bind(&location.metadata)
    .fetch_one(pool)
    .await?;

    Ok(is_new)
}

/// Fetch one location by its CRM identifier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_crm_location_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<CrmLocationRow>, DbError> {
    let row = sqlx::query_as::<_, CrmLocationRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM crm_locations WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All stored locations ordered by display name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_crm_locations(pool: &PgPool) -> Result<Vec<CrmLocationRow>, DbError> {
    let rows = sqlx::query_as::<_, CrmLocationRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM crm_locations \
         ORDER BY name ASC NULLS LAST, external_id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of locations not tombstoned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_crm_locations(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM crm_locations WHERE removed_upstream_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Tombstone every live location whose `external_id` is not in `seen_ids`.
///
/// Returns the number of rows newly marked. An empty `seen_ids` marks every
/// live row: `external_id != ALL('{}')` is `TRUE` for all of them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_missing_locations(pool: &PgPool, seen_ids: &[String]) -> Result<u64, DbError> {
    let rows_affected = sqlx::query(
        "UPDATE crm_locations \
         SET removed_upstream_at = NOW(), updated_at = NOW() \
         WHERE removed_upstream_at IS NULL \
           AND external_id != ALL($1::text[])",
    )
    .bind(seen_ids)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected)
}
