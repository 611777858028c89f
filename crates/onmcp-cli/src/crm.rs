//! CRM command handlers for the CLI.
//!
//! Called from `main` after the database pool and config are established.

use chrono::{DateTime, Utc};
use onmcp_crm::CrmClient;
use onmcp_sync::SyncOptions;

const NAME_WIDTH: usize = 40;

/// Format an optional timestamp for display, returning `"-"` when `None`.
fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        format!("{}...", value.chars().take(width - 3).collect::<String>())
    } else {
        value.to_string()
    }
}

/// Run one full sync and print the tallies.
///
/// # Errors
///
/// Returns an error if the CRM client cannot be built or the sync fails. A
/// failed sync has already flagged the agency and closed its log entry.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &onmcp_core::AppConfig,
    options: &SyncOptions,
) -> anyhow::Result<()> {
    if !config.crm.is_configured() {
        anyhow::bail!("set CRM_AGENCY_API_KEY or CRM_PIT_KEY before running a sync");
    }
    let client = CrmClient::new(&config.crm)?;

    tracing::info!(
        prune_missing = options.prune_missing,
        max_pages = options.max_pages,
        "starting crm location sync"
    );
    let summary = onmcp_sync::run_full_sync(pool, &client, options).await?;
    tracing::info!(
        sync_log_id = summary.sync_log_id,
        total = summary.total,
        duration_ms = summary.duration_ms,
        "crm location sync finished"
    );

    println!(
        "synced {} locations ({} added, {} updated, {} deactivated, {} skipped) in {} ms",
        summary.total,
        summary.added,
        summary.updated,
        summary.deactivated,
        summary.skipped,
        summary.duration_ms
    );
    Ok(())
}

/// Print stored locations, including tombstoned ones.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_locations(pool: &sqlx::PgPool, limit: usize) -> anyhow::Result<()> {
    let locations = onmcp_db::list_crm_locations(pool).await?;

    if locations.is_empty() {
        println!("no locations stored; run `sync` first");
        return Ok(());
    }

    println!(
        "{:<26}{:<w$}{:<20}{:<8}REMOVED",
        "EXTERNAL ID",
        "NAME",
        "CITY",
        "STATE",
        w = NAME_WIDTH
    );
    for location in locations.iter().take(limit) {
        println!(
            "{:<26}{:<w$}{:<20}{:<8}{}",
            location.external_id,
            truncate(location.name.as_deref().unwrap_or("-"), NAME_WIDTH - 2),
            location.city.as_deref().unwrap_or("-"),
            location.state.as_deref().unwrap_or("-"),
            fmt_time(location.removed_upstream_at),
            w = NAME_WIDTH
        );
    }
    if locations.len() > limit {
        println!("... {} more", locations.len() - limit);
    }

    Ok(())
}

/// Print the agency row, credential presence, and recent sync runs.
///
/// # Errors
///
/// Returns an error if the database is unreachable, unmigrated, or a query
/// fails.
pub(crate) async fn run_status(
    pool: &sqlx::PgPool,
    config: &onmcp_core::AppConfig,
    limit: u32,
) -> anyhow::Result<()> {
    onmcp_db::health_check(pool).await?;

    match onmcp_db::get_agency_config(pool).await? {
        Some(agency) => {
            println!(
                "Agency: {} ({})",
                if agency.agency_name.is_empty() {
                    "-"
                } else {
                    agency.agency_name.as_str()
                },
                agency.agency_id.as_deref().unwrap_or("no agency id")
            );
            println!("Status: {}", agency.status);
            println!("Locations: {}", agency.location_count);
            println!("Last sync: {}", fmt_time(agency.last_sync_at));
        }
        None => println!("Agency: not configured"),
    }
    println!(
        "CRM credentials: {}",
        if config.crm.is_configured() {
            "present"
        } else {
            "missing"
        }
    );
    println!();

    let logs = onmcp_db::list_sync_logs(pool, i64::from(limit)).await?;
    if logs.is_empty() {
        println!("no sync runs recorded");
        return Ok(());
    }

    println!(
        "{:<18}{:<11}{:<8}{:<8}{:<8}{:<8}{:<10}ERROR",
        "STARTED", "STATUS", "TOTAL", "ADDED", "UPDATED", "REMOVED", "MS"
    );
    for log in &logs {
        println!(
            "{:<18}{:<11}{:<8}{:<8}{:<8}{:<8}{:<10}{}",
            fmt_time(Some(log.started_at)),
            log.status,
            log.total_synced,
            log.added,
            log.updated,
            log.deactivated,
            log.duration_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string()),
            log.error_message.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_values() {
        assert_eq!(truncate("Downtown", 10), "Downtown");
    }

    #[test]
    fn truncate_shortens_long_values() {
        assert_eq!(truncate("Downtown Austin Studio", 10), "Downtow...");
    }

    #[test]
    fn fmt_time_renders_dash_for_none() {
        assert_eq!(fmt_time(None), "-");
    }
}
