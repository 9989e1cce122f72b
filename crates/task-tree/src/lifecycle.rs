//! Task state bookkeeping and timeout supervision.
//!
//! A [`TaskBody`] describes what a task does on each tick. [`Supervised`]
//! wraps a body with a [`Lifecycle`] and turns it into a [`Task`]:
//!
//! 1. terminal tasks ignore further ticks
//! 2. the first tick moves `Pending` to `Running` and starts the clock
//! 3. the elapsed-time check runs before the body on every tick
//! 4. the body reports [`Progress`]; only `Complete` and `Fail` end the task
//!
//! Bodies never touch [`TaskState`] directly, so a task cannot leave a
//! terminal state or skip `Running`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{Task, TaskEnv, TaskFailure, TaskState, Timestamp};

/// How a task's timeout is chosen when it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Deadline {
    /// Use [`TaskEnv::default_timeout`].
    #[default]
    Inherit,
    After(Duration),
    /// Never time out. Used by composites whose children carry their own.
    Never,
}

/// What a timeout means for the phase a body is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    #[default]
    Fail,
    /// Best-effort phases treat running out of time as success.
    Succeed,
}

/// Result of one body step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Complete,
    Fail(TaskFailure),
}

/// Per-tick behavior of a supervised task.
pub trait TaskBody<C>: Send {
    fn description(&self) -> &str;

    fn can_execute(&self, _ctx: &C) -> bool {
        true
    }

    /// Runs one tick of work.
    fn step(&mut self, ctx: &mut C) -> Progress;

    /// Timeout handling for the body's current phase.
    fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::Fail
    }

    /// Clears all progress, keeping configuration.
    fn reset(&mut self);

    /// Releases in-flight work when the task is stopped from outside.
    fn abandon(&mut self) {}
}

/// State container for one task.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: TaskState,
    deadline: Deadline,
    timeout: Option<Duration>,
    started_at: Option<Timestamp>,
    ticks: u64,
    failure: Option<TaskFailure>,
}

impl Lifecycle {
    pub fn new(deadline: Deadline) -> Self {
        Self {
            state: TaskState::Pending,
            deadline,
            timeout: None,
            started_at: None,
            ticks: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Effective timeout, resolved when the task starts.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Ticks executed in the current attempt.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    pub fn elapsed(&self, now: Timestamp) -> Duration {
        self.started_at
            .map(|start| now.saturating_since(start))
            .unwrap_or_default()
    }

    /// Elapsed time once it has reached the timeout.
    pub fn expired(&self, now: Timestamp) -> Option<Duration> {
        let timeout = self.timeout?;
        let elapsed = self.elapsed(now);
        (elapsed >= timeout).then_some(elapsed)
    }

    /// Moves `Pending` to `Running` and starts the clock.
    pub fn begin(&mut self, now: Timestamp, default_timeout: Option<Duration>) -> bool {
        if !self.transition(TaskState::Running) {
            return false;
        }
        self.started_at = Some(now);
        self.timeout = match self.deadline {
            Deadline::Inherit => default_timeout,
            Deadline::After(timeout) => Some(timeout),
            Deadline::Never => None,
        };
        true
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn complete(&mut self) -> bool {
        self.transition(TaskState::Completed)
    }

    pub fn fail(&mut self, failure: TaskFailure) -> bool {
        if !self.transition(TaskState::Failed) {
            return false;
        }
        self.failure = Some(failure);
        true
    }

    pub fn cancel(&mut self) -> bool {
        self.transition(TaskState::Cancelled)
    }

    /// Back to `Pending` with no progress. The deadline is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.deadline);
    }

    fn settle_complete(&mut self, task: &str, now: Timestamp) {
        if self.complete() {
            info!(
                task,
                ticks = self.ticks,
                elapsed_ms = self.elapsed(now).as_millis() as u64,
                "task completed"
            );
        }
    }

    fn settle_fail(&mut self, task: &str, failure: TaskFailure, now: Timestamp) {
        let reason = failure.to_string();
        if self.fail(failure) {
            warn!(
                task,
                ticks = self.ticks,
                elapsed_ms = self.elapsed(now).as_millis() as u64,
                %reason,
                "task failed"
            );
        }
    }

    fn transition(&mut self, next: TaskState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "ignored invalid task state transition");
            return false;
        }
        self.state = next;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(Deadline::default())
    }
}

/// A [`TaskBody`] with lifecycle supervision.
pub struct Supervised<B> {
    body: B,
    lifecycle: Lifecycle,
}

impl<B> Supervised<B> {
    pub fn new(body: B, deadline: Deadline) -> Self {
        Self {
            body,
            lifecycle: Lifecycle::new(deadline),
        }
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl<C, B> Task<C> for Supervised<B>
where
    C: TaskEnv,
    B: TaskBody<C>,
{
    fn can_execute(&self, ctx: &C) -> bool {
        self.body.can_execute(ctx)
    }

    fn execute(&mut self, ctx: &mut C) {
        if self.lifecycle.state().is_terminal() {
            return;
        }

        let now = ctx.now();
        if self.lifecycle.state() == TaskState::Pending
            && self.lifecycle.begin(now, ctx.default_timeout())
        {
            debug!(
                task = self.body.description(),
                timeout = ?self.lifecycle.timeout(),
                "task started"
            );
        }
        self.lifecycle.record_tick();

        if let Some(elapsed) = self.lifecycle.expired(now) {
            match self.body.timeout_policy() {
                TimeoutPolicy::Succeed => {
                    debug!(
                        task = self.body.description(),
                        "timeout reached in a best-effort phase"
                    );
                    self.lifecycle
                        .settle_complete(self.body.description(), now);
                }
                TimeoutPolicy::Fail => {
                    self.body.abandon();
                    self.lifecycle.settle_fail(
                        self.body.description(),
                        TaskFailure::GlobalTimeout {
                            elapsed_ms: elapsed.as_millis() as u64,
                        },
                        now,
                    );
                }
            }
            return;
        }

        match self.body.step(ctx) {
            Progress::Continue => {}
            Progress::Complete => self
                .lifecycle
                .settle_complete(self.body.description(), now),
            Progress::Fail(failure) => {
                self.lifecycle
                    .settle_fail(self.body.description(), failure, now)
            }
        }
    }

    fn state(&self) -> TaskState {
        self.lifecycle.state()
    }

    fn failure(&self) -> Option<&TaskFailure> {
        self.lifecycle.failure()
    }

    fn description(&self) -> &str {
        self.body.description()
    }

    fn reset(&mut self) {
        self.body.abandon();
        self.body.reset();
        self.lifecycle.reset();
    }

    fn cancel(&mut self) {
        if self.lifecycle.state().is_terminal() {
            return;
        }
        self.body.abandon();
        if self.lifecycle.cancel() {
            info!(task = self.body.description(), "task cancelled");
        }
    }
}
