//! Failure reasons carried by terminal tasks.
//!
//! Every failure renders a short human-readable reason. [`FailureKind`]
//! groups reasons into the categories callers branch on: a target that was
//! never there calls for a different strategy than one that was contested.

use thiserror::Error;

/// Why a task ended in [`TaskState::Failed`](crate::TaskState::Failed).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TaskFailure {
    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("target is blocked (no reachable adjacent tile): {0}")]
    TargetUnreachable(String),

    #[error("target despawned repeatedly ({retries} times), may be contested or unavailable")]
    TargetDespawned { retries: u32 },

    #[error("action rejected: {0}")]
    ActionRejected(String),

    #[error("interaction timeout: no response from game after {ticks} ticks")]
    ResponseTimeout { ticks: u32 },

    #[error("task timed out after {elapsed_ms}ms")]
    GlobalTimeout { elapsed_ms: u64 },

    #[error("no click point: {0}")]
    ClickPointUnavailable(String),

    #[error("could not clear {name} after {attempts} attempts")]
    ObstacleUnresolved { name: String, attempts: u32 },

    #[error("sub-task '{description}' failed: {reason}")]
    SubTaskFailed {
        description: String,
        reason: Box<TaskFailure>,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Coarse failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum FailureKind {
    /// No matching reachable target existed.
    NotFound,
    /// The target existed but kept vanishing or moving.
    Despawned,
    /// The input layer refused or failed an action.
    ActionRejected,
    /// No success signal after the action was performed.
    ResponseTimeout,
    /// The task ran out of time.
    GlobalTimeout,
    Cancelled,
    Other,
}

impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskFailure::TargetNotFound(_)
            | TaskFailure::TargetUnreachable(_)
            | TaskFailure::ObstacleUnresolved { .. } => FailureKind::NotFound,
            TaskFailure::TargetDespawned { .. } => FailureKind::Despawned,
            TaskFailure::ActionRejected(_) => FailureKind::ActionRejected,
            TaskFailure::ResponseTimeout { .. } => FailureKind::ResponseTimeout,
            TaskFailure::GlobalTimeout { .. } => FailureKind::GlobalTimeout,
            TaskFailure::Cancelled => FailureKind::Cancelled,
            TaskFailure::SubTaskFailed { reason, .. } => reason.kind(),
            TaskFailure::ClickPointUnavailable(_) | TaskFailure::Other(_) => FailureKind::Other,
        }
    }

    /// Wraps a child failure with the child's description.
    pub fn sub_task(description: impl Into<String>, reason: TaskFailure) -> Self {
        TaskFailure::SubTaskFailed {
            description: description.into(),
            reason: Box::new(reason),
        }
    }
}
