//! caiyun-maintenance - daily account maintenance runner
//!
//! Runs one maintenance pass and exits, or with `--daemon` runs a pass on
//! every configured cron schedule until Ctrl-C.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use caiyun_maintenance::{
    client::{CaiyunClient, CloudApi, Endpoints},
    schedule::{maintenance_job, run_pass},
    telemetry::init_tracing,
    validate_config, AppConfig, ConfigLoader, MaintenancePass,
};
use clap::Parser;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};
use tracing::info;

/// Caiyun account maintenance CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML, YAML or JSON); .env and environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep running and start a pass on every SCHEDULE cron expression (local time)
    #[arg(long)]
    daemon: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().context("failed to load configuration")?;
    validate_config(&config).context("invalid configuration")?;

    init_tracing(&config.log_level, config.json_logs())?;

    let pass = Arc::new(build_pass(&config)?);

    if args.daemon {
        run_scheduled(pass, &config).await
    } else {
        Ok(run_pass(&pass).await?)
    }
}

fn build_pass(config: &AppConfig) -> anyhow::Result<MaintenancePass> {
    let client = CaiyunClient::with_timeout(Endpoints::default(), config.http_timeout())
        .context("failed to build HTTP client")?;
    let api: Arc<dyn CloudApi> = Arc::new(client);

    Ok(
        MaintenancePass::new(api, config.account_auth.as_str(), config.account_phone.as_str())
            .with_upload(config.upload_config())
            .with_share(config.share_config()),
    )
}

async fn run_scheduled(pass: Arc<MaintenancePass>, config: &AppConfig) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

    for expr in config.schedules() {
        let job = maintenance_job(expr, pass.clone())
            .map_err(scheduler_error)
            .with_context(|| format!("invalid schedule '{expr}'"))?;

        scheduler.add(job).await.map_err(scheduler_error)?;
        info!(schedule = expr, "scheduled maintenance pass");
    }

    scheduler.start().await.map_err(scheduler_error)?;
    info!("scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    scheduler.shutdown().await.map_err(scheduler_error)?;
    Ok(())
}

fn scheduler_error(e: JobSchedulerError) -> anyhow::Error {
    anyhow::anyhow!("scheduler error: {e:?}")
}
