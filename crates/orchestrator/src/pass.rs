use std::sync::Arc;

use caiyun_auth::{CredentialExchange, ExchangeError, ExchangeOutcome, ExchangeStep};
use caiyun_client::CloudApi;
use caiyun_tasks::{CheckInTask, QuotaQueryTask, ShareTask, TaskContext, UploadTask};
use caiyun_types::{ShareConfig, TokenChain, UploadConfig};
use thiserror::Error;
use tracing::{error, info};

use crate::{Orchestrator, OrchestratorError, RunReport};

#[derive(Debug, Error)]
pub enum PassError {
    /// The service refused one of the exchange steps
    #[error("credential exchange rejected at {step}: {reason}")]
    ExchangeRejected { step: ExchangeStep, reason: String },

    #[error("credential exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// One complete maintenance run for a single account.
///
/// Establishes the token chain from scratch, then runs check-in, upload,
/// share and quota query in that order. Upload precedes share so a freshly
/// uploaded file can be the share target.
pub struct MaintenancePass {
    api: Arc<dyn CloudApi>,
    durable_credential: String,
    account_id: String,
    upload: UploadConfig,
    share: ShareConfig,
}

impl MaintenancePass {
    pub fn new(
        api: Arc<dyn CloudApi>,
        durable_credential: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            durable_credential: durable_credential.into(),
            account_id: account_id.into(),
            upload: UploadConfig::disabled(),
            share: ShareConfig::disabled(),
        }
    }

    pub fn with_upload(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_share(mut self, share: ShareConfig) -> Self {
        self.share = share;
        self
    }

    /// Exchange credentials, then run every task.
    ///
    /// Any exchange failure ends the pass before a task runs. Task failures
    /// only show up in the returned report.
    pub async fn run(&self) -> Result<RunReport, PassError> {
        let tokens = Arc::new(TokenChain::new(
            self.durable_credential.as_str(),
            self.account_id.as_str(),
        ));

        let exchange = CredentialExchange::new(self.api.clone(), tokens.clone());
        match exchange.establish().await? {
            ExchangeOutcome::Established => {}
            ExchangeOutcome::Failed { step, reason } => {
                error!(%step, reason = %reason, "credential exchange rejected, no tasks will run");
                return Err(PassError::ExchangeRejected { step, reason });
            }
        }

        let ctx = TaskContext::new(self.api.clone(), tokens);
        let mut orchestrator = self.build_orchestrator(ctx)?;
        let report = orchestrator.run().await?;
        info!(succeeded = report.all_succeeded(), "maintenance pass complete");
        Ok(report)
    }

    fn build_orchestrator(&self, ctx: TaskContext) -> Result<Orchestrator, OrchestratorError> {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register(Box::new(CheckInTask::new(ctx.clone())))?;
        orchestrator.register(Box::new(UploadTask::new(ctx.clone(), self.upload.clone())))?;
        orchestrator.register(Box::new(ShareTask::new(ctx.clone(), self.share.clone())))?;
        orchestrator.register(Box::new(QuotaQueryTask::new(ctx)))?;
        Ok(orchestrator)
    }
}
