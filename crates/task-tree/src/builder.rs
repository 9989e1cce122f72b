//! Builder utilities for ergonomic task tree construction.
//!
//! Instead of writing `Box::new(Supervised::new(Sequence::new(..), Deadline::Never))`,
//! use shorter functions like `sequence("..", vec![...])`. Composites built
//! here never time out on their own; their children carry the deadlines.

use crate::{
    Conditional, Deadline, Fallback, Optional, Sequence, Supervised, Task, TaskEnv, WaitUntil,
};

/// Creates a sequence that runs `children` once.
#[inline]
pub fn sequence<C: TaskEnv + 'static>(
    description: impl Into<String>,
    children: Vec<Box<dyn Task<C>>>,
) -> Box<dyn Task<C>> {
    Box::new(Supervised::new(
        Sequence::new(description, children),
        Deadline::Never,
    ))
}

/// Creates a sequence that loops until `done` holds or `max_iterations` runs.
#[inline]
pub fn repeat_until<C, F>(
    description: impl Into<String>,
    children: Vec<Box<dyn Task<C>>>,
    max_iterations: u32,
    done: F,
) -> Box<dyn Task<C>>
where
    C: TaskEnv + 'static,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    Box::new(Supervised::new(
        Sequence::new(description, children)
            .repeat(max_iterations)
            .until(done),
        Deadline::Never,
    ))
}

/// Creates a fallback over alternatives.
#[inline]
pub fn fallback<C: TaskEnv + 'static>(
    description: impl Into<String>,
    children: Vec<Box<dyn Task<C>>>,
) -> Box<dyn Task<C>> {
    Box::new(Supervised::new(
        Fallback::new(description, children),
        Deadline::Never,
    ))
}

/// Creates a conditional with an optional else branch.
#[inline]
pub fn conditional<C, F>(
    description: impl Into<String>,
    predicate: F,
    then: Box<dyn Task<C>>,
    otherwise: Option<Box<dyn Task<C>>>,
) -> Box<dyn Task<C>>
where
    C: TaskEnv + 'static,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    let mut body = Conditional::new(description, predicate, then);
    if let Some(otherwise) = otherwise {
        body = body.otherwise(otherwise);
    }
    Box::new(Supervised::new(body, Deadline::Never))
}

/// Wraps a task so that its failure does not propagate.
#[inline]
pub fn optional<C: TaskEnv + 'static>(child: Box<dyn Task<C>>) -> Box<dyn Task<C>> {
    Box::new(Supervised::new(Optional::new(child), Deadline::Never))
}

/// Creates a wait that fails with a response timeout after `max_ticks`.
#[inline]
pub fn wait_until<C, F>(
    description: impl Into<String>,
    condition: F,
    max_ticks: u32,
) -> Box<dyn Task<C>>
where
    C: TaskEnv + 'static,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    Box::new(Supervised::new(
        WaitUntil::new(description, condition).within_ticks(max_ticks),
        Deadline::Inherit,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Progress, TaskBody, TaskState, Timestamp};

    struct TestContext {
        value: i32,
        door_open: bool,
    }

    impl TaskEnv for TestContext {
        fn now(&self) -> Timestamp {
            Timestamp::ZERO
        }
    }

    struct Increment;

    impl TaskBody<TestContext> for Increment {
        fn description(&self) -> &str {
            "increment"
        }

        fn step(&mut self, ctx: &mut TestContext) -> Progress {
            ctx.value += 1;
            Progress::Complete
        }

        fn reset(&mut self) {}
    }

    struct OpenDoor;

    impl TaskBody<TestContext> for OpenDoor {
        fn description(&self) -> &str {
            "open door"
        }

        fn step(&mut self, ctx: &mut TestContext) -> Progress {
            ctx.door_open = true;
            Progress::Complete
        }

        fn reset(&mut self) {}
    }

    fn increment() -> Box<dyn Task<TestContext>> {
        Box::new(Supervised::new(Increment, Deadline::Never))
    }

    #[test]
    fn builders_compose() {
        let mut tree = sequence(
            "chop and bank",
            vec![
                optional(conditional(
                    "open door if closed",
                    |ctx: &TestContext| !ctx.door_open,
                    Box::new(Supervised::new(OpenDoor, Deadline::Never)),
                    None,
                )),
                repeat_until("chop", vec![increment()], 10, |ctx: &TestContext| {
                    ctx.value >= 3
                }),
                wait_until("door open", |ctx: &TestContext| ctx.door_open, 5),
            ],
        );
        let mut ctx = TestContext {
            value: 0,
            door_open: false,
        };

        let mut ticks = 0;
        while !tree.is_terminal() && ticks < 20 {
            tree.execute(&mut ctx);
            ticks += 1;
        }

        assert_eq!(tree.state(), TaskState::Completed);
        assert!(ctx.door_open);
        assert_eq!(ctx.value, 3);
        assert_eq!(ticks, 5);
    }
}
