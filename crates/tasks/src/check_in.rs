use async_trait::async_trait;
use caiyun_types::{Declared, TaskOutcome};
use tracing::{error, info, warn};

use crate::{TaskContext, TaskError, TaskUnit};

/// Daily check-in.
///
/// Queries today's state first and only commits when the account has not
/// checked in yet, so running it twice a day commits at most once.
pub struct CheckInTask {
    ctx: TaskContext,
}

impl CheckInTask {
    pub fn new(ctx: TaskContext) -> Self {
        Self { ctx }
    }

    /// Whether the account already checked in today.
    ///
    /// A rejected status query is logged and treated as "not yet".
    async fn already_checked_in(&self) -> Result<bool, TaskError> {
        match self.ctx.api.sign_in_status(&self.ctx.tokens).await? {
            Declared::Accepted(status) => Ok(status.signed_in_today),
            Declared::Rejected { message } => {
                warn!(task = self.name(), reason = %message, "check-in status query failed");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl TaskUnit for CheckInTask {
    fn name(&self) -> &str {
        "check-in"
    }

    async fn execute(&self) -> Result<TaskOutcome, TaskError> {
        if self.already_checked_in().await? {
            info!(task = self.name(), outcome = "success", "already checked in today");
            return Ok(TaskOutcome::completed_with("already checked in today"));
        }

        info!(task = self.name(), "not checked in today, checking in");
        match self.ctx.api.sign_in(&self.ctx.tokens).await? {
            Declared::Accepted(()) => {
                info!(task = self.name(), outcome = "success", "checked in");
                Ok(TaskOutcome::completed_with("checked in"))
            }
            Declared::Rejected { message } => {
                error!(task = self.name(), reason = %message, "check-in failed");
                Ok(TaskOutcome::rejected(message))
            }
        }
    }
}
