//! Lifecycle states of a task.

/// The state of a task within one execution attempt.
///
/// # Transitions
///
/// - `Pending` → `Running` on the first executed tick
/// - `Pending` → `Failed` or `Cancelled` before it ever ran
/// - `Running` → `Completed`, `Failed` or `Cancelled`
///
/// Terminal states never change until the task is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TaskState {
    /// Created or reset, not executed yet.
    Pending,

    /// Executed at least once and not finished.
    Running,

    /// Finished successfully.
    Completed,

    /// Finished unsuccessfully. The reason is available from the task.
    Failed,

    /// Stopped by its owner before finishing.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, TaskState::Completed)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        match self {
            TaskState::Pending => matches!(
                next,
                TaskState::Running | TaskState::Failed | TaskState::Cancelled
            ),
            TaskState::Running => matches!(
                next,
                TaskState::Completed | TaskState::Failed | TaskState::Cancelled
            ),
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled => false,
        }
    }
}
