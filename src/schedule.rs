//! Pass execution for the CLI, once or on a cron schedule

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobSchedulerError};
use tracing::{error, info, warn};

use crate::{MaintenancePass, PassError};

/// One pass; only a credential failure is an error
pub async fn run_pass(pass: &MaintenancePass) -> Result<(), PassError> {
    info!("starting maintenance pass");
    let report = pass.run().await?;

    if report.all_succeeded() {
        info!(outcome = "success", "all tasks succeeded");
    } else {
        let failed: Vec<&str> = report.failed().map(|t| t.name.as_str()).collect();
        warn!(failed = ?failed, "some tasks failed");
    }
    Ok(())
}

/// A job that runs `pass` whenever `expr` fires, evaluated in local time.
pub fn maintenance_job(expr: &str, pass: Arc<MaintenancePass>) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(expr, chrono::Local, move |_id, _scheduler| {
        let pass = pass.clone();
        Box::pin(async move {
            if let Err(e) = run_pass(&pass).await {
                error!(error = %e, "maintenance pass failed");
            }
        })
    })
}
