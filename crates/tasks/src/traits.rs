use std::sync::Arc;

use async_trait::async_trait;
use caiyun_client::{ApiError, CloudApi};
use caiyun_types::{TaskOutcome, TokenChain};
use thiserror::Error;

/// Faults that stop a task before it can report an outcome
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("remote call failed: {0}")]
    Api(#[from] ApiError),
}

/// Core trait that every account action implements
#[async_trait]
pub trait TaskUnit: Send + Sync {
    /// Short name used in logs and run reports
    fn name(&self) -> &str;

    /// Run the action once.
    ///
    /// Declared failures come back as a failed [`TaskOutcome`]; `Err` is reserved
    /// for transport and decoding faults.
    async fn execute(&self) -> Result<TaskOutcome, TaskError>;
}

/// What every task needs to reach the service
#[derive(Clone)]
pub struct TaskContext {
    pub api: Arc<dyn CloudApi>,
    pub tokens: Arc<TokenChain>,
}

impl TaskContext {
    pub fn new(api: Arc<dyn CloudApi>, tokens: Arc<TokenChain>) -> Self {
        Self { api, tokens }
    }
}
