use serde::{Deserialize, Serialize};
use std::fmt;

/// What the remote service declared about a call it did answer.
///
/// A rejection is an ordinary value carrying the service's own message; only
/// transport and decoding problems are errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declared<T> {
    Accepted(T),
    Rejected { message: String },
}

impl<T> Declared<T> {
    pub fn rejected(message: impl Into<String>) -> Self {
        Declared::Rejected {
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Declared::Accepted(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Declared<U> {
        match self {
            Declared::Accepted(value) => Declared::Accepted(f(value)),
            Declared::Rejected { message } => Declared::Rejected { message },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Declared::Accepted(value) => Ok(value),
            Declared::Rejected { message } => Err(message),
        }
    }
}

/// Why a task reported failure without faulting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The remote service declared the call failed
    Rejected,
    /// No file in the listing matched the configured name
    NoTarget,
}

/// Result of one task invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    Completed { detail: Option<String> },
    /// Disabled by configuration; counts as success
    Skipped { reason: String },
    Failed { kind: FailureKind, reason: String },
}

impl TaskOutcome {
    pub fn completed() -> Self {
        TaskOutcome::Completed { detail: None }
    }

    pub fn completed_with(detail: impl Into<String>) -> Self {
        TaskOutcome::Completed {
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            kind: FailureKind::Rejected,
            reason: reason.into(),
        }
    }

    pub fn no_target(reason: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            kind: FailureKind::NoTarget,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, TaskOutcome::Failed { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TaskOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed { detail: None } => write!(f, "completed"),
            TaskOutcome::Completed {
                detail: Some(detail),
            } => write!(f, "completed: {}", detail),
            TaskOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            TaskOutcome::Failed {
                kind: FailureKind::Rejected,
                reason,
            } => write!(f, "rejected: {}", reason),
            TaskOutcome::Failed {
                kind: FailureKind::NoTarget,
                reason,
            } => write!(f, "no target: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_classification() {
        assert!(TaskOutcome::completed().is_success());
        assert!(TaskOutcome::skipped("disabled").is_success());
        assert!(!TaskOutcome::rejected("busy").is_success());
        assert!(!TaskOutcome::no_target("nothing").is_success());
    }

    #[test]
    fn test_failure_kinds_are_distinct() {
        assert_eq!(
            TaskOutcome::rejected("x").failure_kind(),
            Some(FailureKind::Rejected)
        );
        assert_eq!(
            TaskOutcome::no_target("x").failure_kind(),
            Some(FailureKind::NoTarget)
        );
        assert_eq!(TaskOutcome::completed().failure_kind(), None);
    }

    #[test]
    fn test_declared_into_result() {
        let ok: Declared<u32> = Declared::Accepted(7);
        assert_eq!(ok.map(|v| v * 2).into_result(), Ok(14));

        let rejected: Declared<u32> = Declared::rejected("token expired");
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.into_result(), Err("token expired".to_string()));
    }
}
