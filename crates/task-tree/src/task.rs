//! Core task trait.
//!
//! This module defines the [`Task`] trait, the interface every caller drives
//! once per tick, and [`TaskEnv`], the minimum a context must provide for
//! supervision.

use std::time::Duration;

use crate::{TaskFailure, TaskState, Timestamp};

/// Context capabilities required by supervised tasks.
pub trait TaskEnv {
    /// Current monotonic time.
    fn now(&self) -> Timestamp;

    /// Timeout applied to tasks that inherit the environment default.
    fn default_timeout(&self) -> Option<Duration> {
        None
    }
}

/// A unit of work that progresses one tick at a time.
pub trait Task<C>: Send {
    /// Precondition gate evaluated before an execution attempt.
    ///
    /// When it returns `false` the caller must not call [`execute`](Task::execute).
    /// An unmet precondition is not a task failure.
    fn can_execute(&self, _ctx: &C) -> bool {
        true
    }

    /// Advances exactly one tick of work. A no-op once terminal.
    fn execute(&mut self, ctx: &mut C);

    fn state(&self) -> TaskState;

    /// Failure reason, present only in [`TaskState::Failed`].
    fn failure(&self) -> Option<&TaskFailure>;

    /// Diagnostic description.
    fn description(&self) -> &str;

    /// Returns the task to `Pending`, clearing all progress but keeping its
    /// configuration.
    fn reset(&mut self);

    /// Stops a non-terminal task. Terminal tasks are left unchanged.
    fn cancel(&mut self);

    #[inline]
    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}

/// Blanket implementation for boxed tasks.
///
/// This allows `Box<dyn Task<C>>` to also implement `Task<C>`, enabling
/// heterogeneous collections of tasks.
impl<C, T: Task<C> + ?Sized> Task<C> for Box<T> {
    #[inline]
    fn can_execute(&self, ctx: &C) -> bool {
        (**self).can_execute(ctx)
    }

    #[inline]
    fn execute(&mut self, ctx: &mut C) {
        (**self).execute(ctx)
    }

    #[inline]
    fn state(&self) -> TaskState {
        (**self).state()
    }

    #[inline]
    fn failure(&self) -> Option<&TaskFailure> {
        (**self).failure()
    }

    #[inline]
    fn description(&self) -> &str {
        (**self).description()
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset()
    }

    #[inline]
    fn cancel(&mut self) {
        (**self).cancel()
    }
}
