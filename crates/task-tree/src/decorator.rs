//! Decorator task bodies.
//!
//! Decorators wrap a child task and change when it runs or what its result
//! means. This module provides [`Conditional`] (branching) and [`Optional`]
//! (failure suppression).

use tracing::debug;

use crate::{Progress, Task, TaskBody, TaskEnv, TaskFailure, TaskState};

type Predicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Chooses one of two children when it starts.
///
/// # Semantics
///
/// - The predicate is evaluated once, on the first tick
/// - `true` runs the `then` child, `false` runs the `otherwise` child
/// - Without an `otherwise` child, a false predicate completes immediately
/// - The chosen child's result becomes the conditional's result
pub struct Conditional<C> {
    description: String,
    predicate: Predicate<C>,
    then: Box<dyn Task<C>>,
    otherwise: Option<Box<dyn Task<C>>>,
    branch: Option<bool>,
}

impl<C> Conditional<C> {
    pub fn new<F>(description: impl Into<String>, predicate: F, then: Box<dyn Task<C>>) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Box::new(predicate),
            then,
            otherwise: None,
            branch: None,
        }
    }

    pub fn otherwise(mut self, task: Box<dyn Task<C>>) -> Self {
        self.otherwise = Some(task);
        self
    }

    /// Branch taken in the current attempt, once decided.
    pub fn branch(&self) -> Option<bool> {
        self.branch
    }

    fn chosen(&mut self) -> Option<&mut Box<dyn Task<C>>> {
        match self.branch? {
            true => Some(&mut self.then),
            false => self.otherwise.as_mut(),
        }
    }
}

impl<C: TaskEnv> TaskBody<C> for Conditional<C> {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, ctx: &mut C) -> Progress {
        if self.branch.is_none() {
            let branch = (self.predicate)(&*ctx);
            debug!(task = %self.description, branch, "condition evaluated");
            self.branch = Some(branch);
        }

        let Some(child) = self.chosen() else {
            return Progress::Complete;
        };

        if child.state() == TaskState::Pending && !child.can_execute(&*ctx) {
            return Progress::Fail(TaskFailure::sub_task(
                child.description(),
                TaskFailure::Other("precondition not met".to_string()),
            ));
        }

        child.execute(ctx);
        match child.state() {
            TaskState::Pending | TaskState::Running => Progress::Continue,
            TaskState::Completed => Progress::Complete,
            TaskState::Failed | TaskState::Cancelled => {
                let reason = child.failure().cloned().unwrap_or(TaskFailure::Cancelled);
                Progress::Fail(TaskFailure::sub_task(child.description(), reason))
            }
        }
    }

    fn reset(&mut self) {
        self.branch = None;
        self.then.reset();
        if let Some(otherwise) = &mut self.otherwise {
            otherwise.reset();
        }
    }

    fn abandon(&mut self) {
        if let Some(child) = self.chosen() {
            child.cancel();
        }
    }
}

/// Runs its child and completes no matter how the child ended.
///
/// Useful for best-effort steps inside a [`Sequence`](crate::Sequence), such
/// as closing an interface that may already be closed. A child whose
/// precondition is unmet is skipped.
pub struct Optional<C> {
    child: Box<dyn Task<C>>,
}

impl<C> Optional<C> {
    pub fn new(child: Box<dyn Task<C>>) -> Self {
        Self { child }
    }
}

impl<C: TaskEnv> TaskBody<C> for Optional<C> {
    fn description(&self) -> &str {
        self.child.description()
    }

    fn step(&mut self, ctx: &mut C) -> Progress {
        if self.child.state() == TaskState::Pending && !self.child.can_execute(&*ctx) {
            debug!(task = self.child.description(), "optional step skipped");
            return Progress::Complete;
        }

        self.child.execute(ctx);
        match self.child.state() {
            TaskState::Pending | TaskState::Running => Progress::Continue,
            TaskState::Completed => Progress::Complete,
            TaskState::Failed | TaskState::Cancelled => {
                if let Some(failure) = self.child.failure() {
                    debug!(
                        task = self.child.description(),
                        %failure,
                        "optional step failed, continuing"
                    );
                }
                Progress::Complete
            }
        }
    }

    fn reset(&mut self) {
        self.child.reset();
    }

    fn abandon(&mut self) {
        self.child.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Deadline, Supervised, Timestamp};

    struct TestContext {
        value: i32,
    }

    impl TaskEnv for TestContext {
        fn now(&self) -> Timestamp {
            Timestamp::ZERO
        }
    }

    struct Set {
        value: i32,
    }

    impl TaskBody<TestContext> for Set {
        fn description(&self) -> &str {
            "set"
        }

        fn step(&mut self, ctx: &mut TestContext) -> Progress {
            ctx.value = self.value;
            Progress::Complete
        }

        fn reset(&mut self) {}
    }

    struct FailAndIncrement;

    impl TaskBody<TestContext> for FailAndIncrement {
        fn description(&self) -> &str {
            "fail and increment"
        }

        fn step(&mut self, ctx: &mut TestContext) -> Progress {
            ctx.value += 1;
            Progress::Fail(TaskFailure::Other("nope".into()))
        }

        fn reset(&mut self) {}
    }

    fn set(value: i32) -> Box<dyn Task<TestContext>> {
        Box::new(Supervised::new(Set { value }, Deadline::Never))
    }

    #[test]
    fn conditional_takes_then_branch() {
        let mut task = Supervised::new(
            Conditional::new("if positive", |ctx: &TestContext| ctx.value > 0, set(100))
                .otherwise(set(-100)),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 1 };

        task.execute(&mut ctx);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(ctx.value, 100);
        assert_eq!(task.body().branch(), Some(true));
    }

    #[test]
    fn conditional_takes_else_branch() {
        let mut task = Supervised::new(
            Conditional::new("if positive", |ctx: &TestContext| ctx.value > 0, set(100))
                .otherwise(set(-100)),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        task.execute(&mut ctx);
        assert_eq!(ctx.value, -100);
    }

    #[test]
    fn conditional_without_else_completes() {
        let mut task = Supervised::new(
            Conditional::new("if positive", |ctx: &TestContext| ctx.value > 0, set(100)),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: -5 };

        task.execute(&mut ctx);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(ctx.value, -5);
    }

    #[test]
    fn optional_swallows_failure() {
        let mut task = Supervised::new(
            Optional::new(Box::new(Supervised::new(FailAndIncrement, Deadline::Never))),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        task.execute(&mut ctx);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(ctx.value, 1); // Child still executed
    }
}
