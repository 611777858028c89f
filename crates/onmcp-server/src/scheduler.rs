//! Background job scheduler.
//!
//! Registers the recurring CRM location sync when `ONMCP_SYNC_CRON` is set.

use std::sync::Arc;

use onmcp_crm::CrmClient;
use onmcp_sync::SyncOptions;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    crm: Arc<CrmClient>,
    config: Arc<onmcp_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match config.sync_cron.as_deref() {
        Some(schedule) => {
            register_sync_job(&scheduler, schedule, pool, crm, SyncOptions::from_app_config(&config))
                .await?;
            tracing::info!(schedule, "scheduler: crm sync job registered");
        }
        None => tracing::info!("scheduler: ONMCP_SYNC_CRON not set; no crm sync job"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the CRM location sync on `schedule` (six-field cron, UTC).
async fn register_sync_job(
    scheduler: &JobScheduler,
    schedule: &str,
    pool: PgPool,
    crm: Arc<CrmClient>,
    options: SyncOptions,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let crm = Arc::clone(&crm);

        Box::pin(async move {
            tracing::info!("scheduler: starting crm location sync");
            match onmcp_sync::run_full_sync(&pool, &crm, &options).await {
                Ok(summary) => tracing::info!(
                    total = summary.total,
                    added = summary.added,
                    updated = summary.updated,
                    deactivated = summary.deactivated,
                    "scheduler: crm location sync complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: crm location sync failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
