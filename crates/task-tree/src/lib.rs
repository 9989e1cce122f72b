//! Tick-driven task library for long-running game interactions.
//!
//! Unlike a classic behavior tree, a task here spans many ticks: it is
//! executed once per game tick until it reaches a terminal state, and it may
//! be waiting on asynchronous input or on the world between ticks.
//!
//! - **One step per tick**: [`Task::execute`] advances exactly one tick of work
//! - **Terminal is final**: once completed, failed or cancelled, `execute` is a no-op
//! - **Supervised**: [`Supervised`] adds timeout checks and state bookkeeping
//!   around a [`TaskBody`], so bodies only describe their own progress
//! - **Composable**: a parent runs at most one child through a [`SubTaskSlot`]
//!
//! # Architecture
//!
//! - [`Task`]: Core trait exposed to callers
//! - [`TaskState`]: Pending, Running, Completed, Failed or Cancelled
//! - [`TaskFailure`]: Why a task failed, grouped by [`FailureKind`]
//! - [`Lifecycle`], [`Supervised`], [`TaskBody`]: state container and supervision
//! - Composite tasks: [`Sequence`], [`Fallback`]
//! - Decorator tasks: [`Conditional`], [`Optional`], [`WaitUntil`]

pub mod builder;
pub mod composite;
pub mod decorator;
pub mod failure;
pub mod lifecycle;
pub mod slot;
pub mod state;
pub mod task;
pub mod time;
pub mod wait;

// Re-export core types for ergonomic API
pub use composite::{Fallback, Sequence};
pub use decorator::{Conditional, Optional};
pub use failure::{FailureKind, TaskFailure};
pub use lifecycle::{Deadline, Lifecycle, Progress, Supervised, TaskBody, TimeoutPolicy};
pub use slot::{SlotOccupied, SlotPoll, SubTaskOutcome, SubTaskSlot};
pub use state::TaskState;
pub use task::{Task, TaskEnv};
pub use time::Timestamp;
pub use wait::WaitUntil;
