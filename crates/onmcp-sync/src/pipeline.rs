//! Full CRM location sync.
//!
//! One run:
//! 1. opens a `running` sync log entry and flips the agency to `syncing`;
//! 2. pages through the CRM listing until a short page arrives;
//! 3. upserts every payload in arrival order, one statement per location;
//! 4. tombstones stored locations the CRM no longer returns;
//! 5. marks the agency `active` and completes the log entry.
//!
//! Any failure after the log entry exists flips the agency to `error` and
//! closes the entry as `failed` before the error is returned. Upserts already
//! committed stay committed; the run is not atomic. Nothing prevents two runs
//! from overlapping.

use std::time::Instant;

use onmcp_core::AgencyStatus;
use onmcp_crm::{CrmClient, ListLocationsParams};
use onmcp_db::SyncLogCounts;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::SyncError;
use crate::normalize::normalize_location;

pub const SYNC_TYPE_FULL: &str = "full";

const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_PAGES: u32 = 500;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub page_size: u32,
    /// Upper bound on listing requests per run.
    pub max_pages: u32,
    /// Tombstone stored locations absent from this run.
    pub prune_missing: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            prune_missing: true,
        }
    }
}

impl SyncOptions {
    #[must_use]
    pub fn from_app_config(config: &onmcp_core::AppConfig) -> Self {
        Self {
            max_pages: config.sync_max_pages,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub sync_log_id: i64,
    pub total: u64,
    pub added: u64,
    pub updated: u64,
    pub deactivated: u64,
    pub skipped: u64,
    pub duration_ms: u64,
}

/// Run one full reconciliation pass.
///
/// # Errors
///
/// Returns [`SyncError::Crm`] if any listing page fails,
/// [`SyncError::PaginationLimit`] if the listing never ends within
/// `max_pages`, or [`SyncError::Db`] for store failures.
pub async fn run_full_sync(
    pool: &PgPool,
    client: &CrmClient,
    options: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let started = Instant::now();
    let log = onmcp_db::create_sync_log(pool, SYNC_TYPE_FULL).await?;
    tracing::info!(sync_log_id = log.id, "crm sync: started");

    match reconcile(pool, client, options, log.id, started).await {
        Ok(summary) => {
            tracing::info!(
                sync_log_id = log.id,
                total = summary.total,
                added = summary.added,
                updated = summary.updated,
                deactivated = summary.deactivated,
                skipped = summary.skipped,
                duration_ms = summary.duration_ms,
                "crm sync: completed"
            );
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(sync_log_id = log.id, error = %err, "crm sync: failed");
            fail_run_best_effort(pool, log.id, &err, elapsed_ms(started)).await;
            Err(err)
        }
    }
}

async fn reconcile(
    pool: &PgPool,
    client: &CrmClient,
    options: &SyncOptions,
    sync_log_id: i64,
    started: Instant,
) -> Result<SyncSummary, SyncError> {
    onmcp_db::set_agency_status(pool, AgencyStatus::Syncing).await?;

    let company_id = onmcp_db::get_agency_config(pool)
        .await?
        .and_then(|config| config.agency_id);

    let payloads = fetch_all_locations(client, options, company_id).await?;

    let mut added = 0u64;
    let mut updated = 0u64;
    let mut skipped = 0u64;
    let mut seen_ids: Vec<String> = Vec::with_capacity(payloads.len());

    for payload in &payloads {
        let Some(location) = normalize_location(payload) else {
            skipped += 1;
            tracing::warn!(sync_log_id, "crm sync: skipping location payload without id");
            continue;
        };

        if onmcp_db::upsert_crm_location(pool, &location).await? {
            added += 1;
        } else {
            updated += 1;
        }
        seen_ids.push(location.external_id);
    }

    let total = added + updated;

    let deactivated = if options.prune_missing {
        onmcp_db::mark_missing_locations(pool, &seen_ids).await?
    } else {
        0
    };

    onmcp_db::record_agency_sync(pool, total).await?;

    let duration_ms = elapsed_ms(started);
    onmcp_db::complete_sync_log(
        pool,
        sync_log_id,
        &SyncLogCounts {
            total,
            added,
            updated,
            deactivated,
            duration_ms,
        },
    )
    .await?;

    Ok(SyncSummary {
        sync_log_id,
        total,
        added,
        updated,
        deactivated,
        skipped,
        duration_ms,
    })
}

/// Page through the listing from offset 0 until a page comes back shorter
/// than the page size.
async fn fetch_all_locations(
    client: &CrmClient,
    options: &SyncOptions,
    company_id: Option<String>,
) -> Result<Vec<serde_json::Value>, SyncError> {
    let page_size = options.page_size.max(1);
    let full_page = usize::try_from(page_size).unwrap_or(usize::MAX);
    let mut params = ListLocationsParams {
        limit: page_size,
        skip: 0,
        search: None,
        company_id,
    };
    let mut all_locations = Vec::new();
    let mut page_count = 0u32;

    loop {
        let page = client
            .list_locations(&params)
            .await
            .into_result()
            .map_err(|source| SyncError::Crm {
                skip: params.skip,
                source,
            })?;

        let fetched = page.locations.len();
        if fetched == 0 {
            break;
        }
        // Only pages that carried data count toward the limit.
        page_count += 1;
        if page_count > options.max_pages {
            return Err(SyncError::PaginationLimit {
                max_pages: options.max_pages,
            });
        }
        tracing::debug!(skip = params.skip, fetched, reported_total = ?page.total, "crm sync: page");
        all_locations.extend(page.locations);

        if fetched < full_page {
            break;
        }
        params.skip += u64::from(page_size);
    }

    Ok(all_locations)
}

/// Flip the agency to `error` and close the log entry as `failed`, logging
/// rather than propagating any secondary failure.
async fn fail_run_best_effort(pool: &PgPool, sync_log_id: i64, err: &SyncError, duration_ms: u64) {
    if let Err(e) = onmcp_db::set_agency_status(pool, AgencyStatus::Error).await {
        tracing::error!(sync_log_id, error = %e, "crm sync: failed to set agency status to error");
    }
    if let Err(e) = onmcp_db::fail_sync_log(pool, sync_log_id, &err.to_string(), duration_ms).await
    {
        tracing::error!(sync_log_id, error = %e, "crm sync: failed to close sync log");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
