use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};

pub type RunCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub async fn configure_run_jobs(
    cron_specs: &[String],
    callback: RunCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", cron = %cron_label, "pipeline run triggered");
                cb().await;
            })
        })
        .with_context(|| format!("invalid cron spec {spec:?}"))?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "pipeline run registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
