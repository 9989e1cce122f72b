//! Composite task bodies.
//!
//! Composites own their children and run one child per tick. They are
//! wrapped in [`Supervised`](crate::Supervised) like any other body; the
//! builder helpers in [`builder`](crate::builder) do this for you.

use tracing::debug;

use crate::{Progress, Task, TaskBody, TaskEnv, TaskFailure, TaskState};

type StopCondition<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Runs children in order until one fails.
///
/// # Semantics
///
/// - Each tick executes the current child once
/// - A completed child advances to the next one on the following tick
/// - A failed child fails the sequence, wrapped in `SubTaskFailed`
/// - A child whose precondition is unmet when it would start fails the sequence
/// - After the last child, the sequence completes, or starts another
///   iteration when configured with [`repeat`](Sequence::repeat)
///
/// This is analogous to a short-circuited logical AND (&&) spread over ticks.
pub struct Sequence<C> {
    description: String,
    children: Vec<Box<dyn Task<C>>>,
    index: usize,
    iteration: u32,
    max_iterations: u32,
    stop_when: Option<StopCondition<C>>,
}

impl<C> Sequence<C> {
    /// Creates a sequence that runs its children once.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty. A sequence with no children is
    /// meaningless and likely indicates a programming error.
    pub fn new(description: impl Into<String>, children: Vec<Box<dyn Task<C>>>) -> Self {
        assert!(
            !children.is_empty(),
            "Sequence must have at least one child"
        );
        Self {
            description: description.into(),
            children,
            index: 0,
            iteration: 0,
            max_iterations: 1,
            stop_when: None,
        }
    }

    /// Runs the children up to `iterations` times in total.
    pub fn repeat(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations.max(1);
        self
    }

    /// Stops looping as soon as `condition` holds at the end of an iteration.
    pub fn until<F>(mut self, condition: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.stop_when = Some(Box::new(condition));
        self
    }

    /// Completed iterations in the current attempt.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }
}

impl<C: TaskEnv> TaskBody<C> for Sequence<C> {
    fn description(&self) -> &str {
        &self.description
    }

    fn can_execute(&self, ctx: &C) -> bool {
        self.children
            .first()
            .is_some_and(|child| child.can_execute(ctx))
    }

    fn step(&mut self, ctx: &mut C) -> Progress {
        let Some(child) = self.children.get_mut(self.index) else {
            return Progress::Complete;
        };

        if child.state() == TaskState::Pending && !child.can_execute(ctx) {
            return Progress::Fail(TaskFailure::sub_task(
                child.description(),
                TaskFailure::Other("precondition not met".to_string()),
            ));
        }

        child.execute(ctx);
        match child.state() {
            TaskState::Pending | TaskState::Running => Progress::Continue,
            TaskState::Failed | TaskState::Cancelled => {
                let reason = child.failure().cloned().unwrap_or(TaskFailure::Cancelled);
                Progress::Fail(TaskFailure::sub_task(child.description(), reason))
            }
            TaskState::Completed => {
                self.index += 1;
                if self.index < self.children.len() {
                    return Progress::Continue;
                }

                self.iteration += 1;
                let stop = self.stop_when.as_ref().is_some_and(|condition| condition(&*ctx));
                if stop || self.iteration >= self.max_iterations {
                    return Progress::Complete;
                }

                debug!(
                    task = %self.description,
                    iteration = self.iteration,
                    "starting next iteration"
                );
                self.index = 0;
                for child in &mut self.children {
                    child.reset();
                }
                Progress::Continue
            }
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.iteration = 0;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn abandon(&mut self) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.cancel();
        }
    }
}

/// Runs children in order until one completes.
///
/// # Semantics
///
/// - A failed child (or one whose precondition is unmet) moves on to the next
/// - The first completed child completes the fallback
/// - If every child fails, the fallback fails with the last child's reason
///
/// This is analogous to a short-circuited logical OR (||) spread over ticks.
pub struct Fallback<C> {
    description: String,
    children: Vec<Box<dyn Task<C>>>,
    index: usize,
    last_failure: Option<TaskFailure>,
}

impl<C> Fallback<C> {
    /// Creates a fallback over the given alternatives.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(description: impl Into<String>, children: Vec<Box<dyn Task<C>>>) -> Self {
        assert!(
            !children.is_empty(),
            "Fallback must have at least one child"
        );
        Self {
            description: description.into(),
            children,
            index: 0,
            last_failure: None,
        }
    }
}

impl<C: TaskEnv> TaskBody<C> for Fallback<C> {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, ctx: &mut C) -> Progress {
        while let Some(child) = self.children.get_mut(self.index) {
            if child.state() == TaskState::Pending && !child.can_execute(ctx) {
                self.last_failure = Some(TaskFailure::sub_task(
                    child.description(),
                    TaskFailure::Other("precondition not met".to_string()),
                ));
                self.index += 1;
                continue;
            }

            child.execute(ctx);
            return match child.state() {
                TaskState::Pending | TaskState::Running => Progress::Continue,
                TaskState::Completed => Progress::Complete,
                TaskState::Failed | TaskState::Cancelled => {
                    let reason = child.failure().cloned().unwrap_or(TaskFailure::Cancelled);
                    self.last_failure = Some(TaskFailure::sub_task(child.description(), reason));
                    self.index += 1;
                    if self.index < self.children.len() {
                        Progress::Continue
                    } else {
                        Progress::Fail(self.exhausted())
                    }
                }
            };
        }
        Progress::Fail(self.exhausted())
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_failure = None;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn abandon(&mut self) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.cancel();
        }
    }
}

impl<C> Fallback<C> {
    fn exhausted(&mut self) -> TaskFailure {
        self.last_failure
            .take()
            .unwrap_or_else(|| TaskFailure::Other("no alternative succeeded".to_string()))
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

    /// Adds `delta` to the context, finishing on its first tick.
    struct Add {
        delta: i32,
    }

    impl TaskBody<TestContext> for Add {
        fn description(&self) -> &str {
            "add"
        }

        fn step(&mut self, ctx: &mut TestContext) -> Progress {
            ctx.value += self.delta;
            Progress::Complete
        }

        fn reset(&mut self) {}
    }

    struct FailAlways;

    impl TaskBody<TestContext> for FailAlways {
        fn description(&self) -> &str {
            "fail"
        }

        fn step(&mut self, _ctx: &mut TestContext) -> Progress {
            Progress::Fail(TaskFailure::Other("nope".into()))
        }

        fn reset(&mut self) {}
    }

    fn add(delta: i32) -> Box<dyn Task<TestContext>> {
        Box::new(Supervised::new(Add { delta }, Deadline::Never))
    }

    fn fail() -> Box<dyn Task<TestContext>> {
        Box::new(Supervised::new(FailAlways, Deadline::Never))
    }

    fn run<T: Task<TestContext>>(task: &mut T, ctx: &mut TestContext, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !task.is_terminal() && ticks < max_ticks {
            task.execute(ctx);
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn sequence_runs_one_child_per_tick() {
        let mut seq = Supervised::new(
            Sequence::new("two adds", vec![add(1), add(10)]),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        seq.execute(&mut ctx);
        assert_eq!(ctx.value, 1);
        assert_eq!(seq.state(), TaskState::Running);

        seq.execute(&mut ctx);
        assert_eq!(ctx.value, 11);
        assert_eq!(seq.state(), TaskState::Completed);
    }

    #[test]
    fn sequence_fails_on_first_failure() {
        let mut seq = Supervised::new(
            Sequence::new("add, fail, add", vec![add(1), fail(), add(1)]),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        run(&mut seq, &mut ctx, 10);
        assert_eq!(seq.state(), TaskState::Failed);
        assert_eq!(ctx.value, 1); // Third child never ran
        assert!(matches!(
            seq.failure(),
            Some(TaskFailure::SubTaskFailed { description, .. }) if description == "fail"
        ));
    }

    #[test]
    fn repeated_sequence_stops_at_condition() {
        let mut seq = Supervised::new(
            Sequence::new("loop", vec![add(2)])
                .repeat(100)
                .until(|ctx: &TestContext| ctx.value >= 6),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        run(&mut seq, &mut ctx, 50);
        assert_eq!(seq.state(), TaskState::Completed);
        assert_eq!(ctx.value, 6);
        assert_eq!(seq.body().iteration(), 3);
    }

    #[test]
    fn repeated_sequence_respects_iteration_cap() {
        let mut seq = Supervised::new(
            Sequence::new("loop", vec![add(1)]).repeat(4),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        run(&mut seq, &mut ctx, 50);
        assert_eq!(ctx.value, 4);
    }

    #[test]
    fn fallback_uses_first_success() {
        let mut fb = Supervised::new(
            Fallback::new("first that works", vec![fail(), add(5), add(100)]),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        run(&mut fb, &mut ctx, 10);
        assert_eq!(fb.state(), TaskState::Completed);
        assert_eq!(ctx.value, 5);
    }

    #[test]
    fn fallback_fails_when_all_fail() {
        let mut fb = Supervised::new(
            Fallback::new("nothing works", vec![fail(), fail()]),
            Deadline::Never,
        );
        let mut ctx = TestContext { value: 0 };

        run(&mut fb, &mut ctx, 10);
        assert_eq!(fb.state(), TaskState::Failed);
    }
}
