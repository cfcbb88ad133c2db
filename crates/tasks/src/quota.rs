use async_trait::async_trait;
use caiyun_types::TaskOutcome;
use tracing::info;

use crate::{TaskContext, TaskError, TaskUnit};

/// Reports claimable and accumulated cloud units.
///
/// Succeeds whenever the call completes.
pub struct QuotaQueryTask {
    ctx: TaskContext,
}

impl QuotaQueryTask {
    pub fn new(ctx: TaskContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl TaskUnit for QuotaQueryTask {
    fn name(&self) -> &str {
        "quota"
    }

    async fn execute(&self) -> Result<TaskOutcome, TaskError> {
        let balance = self.ctx.api.cloud_balance(&self.ctx.tokens).await?;
        info!(
            task = self.name(),
            claimable = balance.claimable,
            total = balance.total,
            "cloud units"
        );

        Ok(TaskOutcome::completed_with(format!(
            "claimable {}, total {}",
            balance.claimable, balance.total
        )))
    }
}
