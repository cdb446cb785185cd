// Lifecycle states for contexts and tasks

use serde::{Deserialize, Serialize};

/// Context lifecycle
///
/// A transaction handle exists if and only if the phase is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextPhase {
    Uninitialized,
    Active,
    Closed,
}

/// Task lifecycle: `Pending -> Executing -> {Succeeded, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Executing,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Both outcomes are terminal; there is no retry and no re-entry.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Executing)
                | (TaskState::Executing, TaskState::Succeeded)
                | (TaskState::Executing, TaskState::Failed)
        )
    }
}

impl std::fmt::Display for ContextPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextPhase::Uninitialized => write!(f, "UNINITIALIZED"),
            ContextPhase::Active => write!(f, "ACTIVE"),
            ContextPhase::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Executing => write!(f, "EXECUTING"),
            TaskState::Succeeded => write!(f, "SUCCEEDED"),
            TaskState::Failed => write!(f, "FAILED"),
        }
    }
}
