use std::any::Any;
use std::panic::AssertUnwindSafe;

use caiyun_tasks::TaskUnit;
use caiyun_types::TaskOutcome;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lifecycle of one orchestration pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Accepting registrations
    Idle,
    Running,
    /// Every registered unit was attempted once
    Done,
}

/// Runs registered task units in order, isolating each unit's failure.
///
/// A unit that reports a failed outcome, returns an error, or panics is
/// recorded as failed and the next unit runs regardless. The orchestrator is
/// single use: once [`Orchestrator::run`] returns it stays in
/// [`OrchestratorState::Done`].
pub struct Orchestrator {
    units: Vec<Box<dyn TaskUnit>>,
    state: OrchestratorState,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            state: OrchestratorState::Idle,
        }
    }

    /// Append a unit; units run in registration order.
    pub fn register(&mut self, unit: Box<dyn TaskUnit>) -> Result<(), OrchestratorError> {
        if self.state != OrchestratorState::Idle {
            return Err(OrchestratorError::AlreadyRun);
        }
        debug!(task = unit.name(), position = self.units.len(), "registered task");
        self.units.push(unit);
        Ok(())
    }

    /// Builder-style [`Orchestrator::register`] for construction.
    ///
    /// Once the orchestrator has run, the unit is dropped and an error is logged.
    pub fn with_unit(mut self, unit: Box<dyn TaskUnit>) -> Self {
        let name = unit.name().to_string();
        if let Err(e) = self.register(unit) {
            error!(task = %name, error = %e, "task not registered");
        }
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Attempt every registered unit exactly once.
    pub async fn run(&mut self) -> Result<RunReport, OrchestratorError> {
        if self.state != OrchestratorState::Idle {
            return Err(OrchestratorError::AlreadyRun);
        }
        self.state = OrchestratorState::Running;
        info!(tasks = self.units.len(), "starting orchestration pass");

        let mut report = RunReport::default();
        for unit in &self.units {
            let name = unit.name().to_string();
            let result = run_isolated(unit.as_ref()).await;
            report.tasks.push(TaskReport { name, result });
        }

        self.state = OrchestratorState::Done;

        if report.all_succeeded() {
            info!(outcome = "success", tasks = report.tasks.len(), "all tasks succeeded");
        } else {
            warn!(
                failed = report.failed().count(),
                tasks = report.tasks.len(),
                "orchestration pass finished with failures"
            );
        }
        Ok(report)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_isolated(unit: &dyn TaskUnit) -> TaskResult {
    let name = unit.name();
    debug!(task = name, "running task");

    match AssertUnwindSafe(unit.execute()).catch_unwind().await {
        Ok(Ok(outcome)) => {
            match &outcome {
                TaskOutcome::Failed { reason, .. } => {
                    error!(task = name, reason = %reason, "task failed")
                }
                other => info!(task = name, outcome = "success", result = %other, "task finished"),
            }
            TaskResult::Finished(outcome)
        }
        Ok(Err(e)) => {
            error!(task = name, error = %e, "task faulted");
            TaskResult::Faulted {
                error: e.to_string(),
            }
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(task = name, panic = %message, "task panicked");
            TaskResult::Faulted {
                error: format!("panicked: {message}"),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// What happened to one unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskResult {
    /// The unit ran to completion and reported an outcome
    Finished(TaskOutcome),
    /// The unit returned an error or panicked
    Faulted { error: String },
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        match self {
            TaskResult::Finished(outcome) => outcome.is_success(),
            TaskResult::Faulted { .. } => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    pub name: String,
    pub result: TaskResult,
}

/// Per-unit results of one pass, in registration order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    /// Logical AND over every unit; true for an empty pass
    pub fn all_succeeded(&self) -> bool {
        self.tasks.iter().all(|t| t.result.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| !t.result.is_success())
    }

    pub fn get(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator already ran; build a new one for the next pass")]
    AlreadyRun,
}
