//! Single-child delegation.
//!
//! A parent that needs another task's help starts it in a [`SubTaskSlot`] and
//! forwards ticks to it. The child's result is handed back exactly once, at
//! the tick it becomes terminal, and the slot is emptied in the same call.
//! What a child failure means is up to the parent.

use thiserror::Error;

use crate::{Task, TaskFailure, TaskState};

/// How a delegated child ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubTaskOutcome {
    Completed,
    Failed(TaskFailure),
    /// The child's precondition was not met, so it never ran.
    PreconditionUnmet,
}

/// Result of forwarding one tick to the slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotPoll {
    /// No child is active.
    Idle,
    /// The child ran this tick and is not finished.
    Running,
    /// The child finished. Reported once; the slot is now idle.
    Finished(SubTaskOutcome),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("sub-task slot is occupied by '{active}'")]
pub struct SlotOccupied {
    pub active: String,
}

/// Holds at most one active child task.
pub struct SubTaskSlot<C> {
    active: Option<Box<dyn Task<C>>>,
}

impl<C> Default for SubTaskSlot<C> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<C> SubTaskSlot<C> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_description(&self) -> Option<&str> {
        self.active.as_ref().map(|task| task.description())
    }

    /// Installs a child. Fails if another child is still active.
    pub fn start(&mut self, task: Box<dyn Task<C>>) -> Result<(), SlotOccupied> {
        if let Some(active) = &self.active {
            return Err(SlotOccupied {
                active: active.description().to_string(),
            });
        }
        self.active = Some(task);
        Ok(())
    }

    /// Forwards one tick to the active child.
    pub fn drive(&mut self, ctx: &mut C) -> SlotPoll {
        let Some(task) = self.active.as_mut() else {
            return SlotPoll::Idle;
        };

        if task.state() == TaskState::Pending && !task.can_execute(ctx) {
            self.active = None;
            return SlotPoll::Finished(SubTaskOutcome::PreconditionUnmet);
        }

        task.execute(ctx);
        let outcome = match task.state() {
            TaskState::Pending | TaskState::Running => return SlotPoll::Running,
            TaskState::Completed => SubTaskOutcome::Completed,
            TaskState::Failed => SubTaskOutcome::Failed(
                task.failure()
                    .cloned()
                    .unwrap_or_else(|| TaskFailure::Other("sub-task failed".to_string())),
            ),
            TaskState::Cancelled => SubTaskOutcome::Failed(TaskFailure::Cancelled),
        };
        self.active = None;
        SlotPoll::Finished(outcome)
    }

    /// Cancels and drops the active child, if any.
    pub fn cancel(&mut self) {
        if let Some(mut task) = self.active.take() {
            task.cancel();
        }
    }
}
