//! Waiting on the world.

use crate::{Progress, TaskBody, TaskEnv, TaskFailure, TimeoutPolicy};

type Condition<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Completes on the first tick its condition holds.
///
/// With a tick budget, running out either fails with `ResponseTimeout` or,
/// for [`best_effort`](WaitUntil::best_effort) waits, completes. Best-effort
/// waits also treat the global timeout as success.
pub struct WaitUntil<C> {
    description: String,
    condition: Condition<C>,
    max_ticks: Option<u32>,
    best_effort: bool,
    waited: u32,
}

impl<C> WaitUntil<C> {
    pub fn new<F>(description: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            condition: Box::new(condition),
            max_ticks: None,
            best_effort: false,
            waited: 0,
        }
    }

    pub fn within_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    pub fn waited(&self) -> u32 {
        self.waited
    }
}

impl<C: TaskEnv> TaskBody<C> for WaitUntil<C> {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, ctx: &mut C) -> Progress {
        if (self.condition)(&*ctx) {
            return Progress::Complete;
        }

        self.waited += 1;
        match self.max_ticks {
            Some(max) if self.waited >= max => {
                if self.best_effort {
                    Progress::Complete
                } else {
                    Progress::Fail(TaskFailure::ResponseTimeout { ticks: self.waited })
                }
            }
            _ => Progress::Continue,
        }
    }

    fn timeout_policy(&self) -> TimeoutPolicy {
        if self.best_effort {
            TimeoutPolicy::Succeed
        } else {
            TimeoutPolicy::Fail
        }
    }

    fn reset(&mut self) {
        self.waited = 0;
    }
}
