//! Background maintenance jobs.

use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::state::SharedState;

/// Registers the daily audit-log prune and starts the scheduler loop.
pub async fn start(shared: Arc<SharedState>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let retention_days = shared.config.maintenance.audit_retention_days;
    let audit = shared.audit.clone();

    // 04:10 UTC daily, off the top of the hour.
    let prune_job = Job::new_async("0 10 4 * * *", move |_uuid, _lock| {
        let audit = audit.clone();
        Box::pin(async move {
            match audit.prune(retention_days).await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "Pruned audit log entries older than {retention_days} days");
                }
                Ok(_) => {}
                Err(e) => error!("Audit log prune failed: {e}"),
            }
        })
    })?;

    scheduler.add(prune_job).await?;
    scheduler.start().await?;

    info!("Maintenance scheduler started");
    Ok(scheduler)
}
