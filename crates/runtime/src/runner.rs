//! Sequential task queue driven by the game tick.
//!
//! The runner owns a FIFO of task trees and ticks the head once per game
//! tick. A pending head whose precondition does not hold is simply retried on
//! the next tick. Terminal tasks are popped and reported on a broadcast
//! channel so observers (logging, UI, a planner) can follow progress without
//! holding the runner.
use std::collections::VecDeque;
use std::future::Future;

use task_tree::{Task, TaskEnv, TaskFailure, TaskState};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::RunnerConfig;

/// Terminal outcome of one queued task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    pub description: String,
    pub state: TaskState,
    pub failure: Option<TaskFailure>,
    /// Ticks the runner spent executing the task.
    pub ticks: u64,
}

struct Queued<C> {
    task: Box<dyn Task<C>>,
    ticks: u64,
}

pub struct TaskRunner<C> {
    queue: VecDeque<Queued<C>>,
    reports: broadcast::Sender<TaskReport>,
}

impl<C: TaskEnv> TaskRunner<C> {
    pub fn new(report_capacity: usize) -> Self {
        let (reports, _) = broadcast::channel(report_capacity.max(1));
        Self {
            queue: VecDeque::new(),
            reports,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskReport> {
        self.reports.subscribe()
    }

    pub fn push(&mut self, task: Box<dyn Task<C>>) {
        debug!(task = task.description(), queued = self.queue.len() + 1, "task queued");
        self.queue.push_back(Queued { task, ticks: 0 });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The task that the next tick executes.
    pub fn current(&self) -> Option<&dyn Task<C>> {
        self.queue.front().map(|queued| queued.task.as_ref())
    }

    /// Cancels and reports the head task.
    pub fn cancel_current(&mut self) -> Option<TaskReport> {
        let mut queued = self.queue.pop_front()?;
        queued.task.cancel();
        Some(self.finish(queued))
    }

    /// Executes the head task once. Returns its report when it finished.
    pub fn tick(&mut self, ctx: &mut C) -> Option<TaskReport> {
        let queued = self.queue.front_mut()?;

        if queued.task.state() == TaskState::Pending && !queued.task.can_execute(ctx) {
            trace!(task = queued.task.description(), "precondition not met");
            return None;
        }

        queued.task.execute(ctx);
        queued.ticks += 1;
        if !queued.task.is_terminal() {
            return None;
        }

        let queued = self.queue.pop_front()?;
        Some(self.finish(queued))
    }

    fn finish(&self, queued: Queued<C>) -> TaskReport {
        let report = TaskReport {
            description: queued.task.description().to_string(),
            state: queued.task.state(),
            failure: queued.task.failure().cloned(),
            ticks: queued.ticks,
        };

        match &report.failure {
            Some(failure) => warn!(
                task = %report.description,
                state = %report.state,
                ticks = report.ticks,
                %failure,
                "task finished"
            ),
            None => info!(
                task = %report.description,
                state = %report.state,
                ticks = report.ticks,
                "task finished"
            ),
        }

        // No subscribers is fine
        let _ = self.reports.send(report.clone());
        report
    }

    /// Ticks on a fixed interval until the queue drains or `shutdown`
    /// resolves. On shutdown the head task is cancelled; the rest stay queued.
    pub async fn run<F>(
        &mut self,
        ctx: &mut C,
        config: &RunnerConfig,
        shutdown: F,
    ) -> Vec<TaskReport>
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            queued = self.len(),
            tick_ms = config.tick_interval.as_millis() as u64,
            "runner started"
        );

        let mut reports = Vec::new();
        while !self.is_empty() {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(remaining = self.len(), "shutdown requested");
                    reports.extend(self.cancel_current());
                    break;
                }
                _ = interval.tick() => {
                    reports.extend(self.tick(ctx));
                }
            }
        }

        info!(finished = reports.len(), "runner stopped");
        reports
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use task_tree::Timestamp;

    use super::*;

    #[derive(Default)]
    struct Env {
        ready: bool,
    }

    impl TaskEnv for Env {
        fn now(&self) -> Timestamp {
            Timestamp(0)
        }
    }

    /// Completes after `ticks` executions, or fails when `fails` is set.
    struct Countdown {
        name: String,
        ticks: u32,
        remaining: u32,
        fails: bool,
        gated: bool,
        state: TaskState,
        failure: Option<TaskFailure>,
    }

    impl Countdown {
        fn new(name: &str, ticks: u32) -> Self {
            Self {
                name: name.to_string(),
                ticks,
                remaining: ticks,
                fails: false,
                gated: false,
                state: TaskState::Pending,
                failure: None,
            }
        }

        fn failing(mut self) -> Self {
            self.fails = true;
            self
        }

        fn gated(mut self) -> Self {
            self.gated = true;
            self
        }
    }

    impl Task<Env> for Countdown {
        fn can_execute(&self, ctx: &Env) -> bool {
            !self.gated || ctx.ready
        }

        fn execute(&mut self, _ctx: &mut Env) {
            if self.state.is_terminal() {
                return;
            }
            self.state = TaskState::Running;
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                if self.fails {
                    self.state = TaskState::Failed;
                    self.failure = Some(TaskFailure::Other("boom".into()));
                } else {
                    self.state = TaskState::Completed;
                }
            }
        }

        fn state(&self) -> TaskState {
            self.state
        }

        fn failure(&self) -> Option<&TaskFailure> {
            self.failure.as_ref()
        }

        fn description(&self) -> &str {
            &self.name
        }

        fn reset(&mut self) {
            self.remaining = self.ticks;
            self.state = TaskState::Pending;
            self.failure = None;
        }

        fn cancel(&mut self) {
            if !self.state.is_terminal() {
                self.state = TaskState::Cancelled;
            }
        }
    }

    #[test]
    fn tasks_run_in_order_and_are_reported() {
        let mut runner = TaskRunner::new(8);
        let mut reports = runner.subscribe();
        runner.push(Box::new(Countdown::new("first", 2)));
        runner.push(Box::new(Countdown::new("second", 1).failing()));
        let mut env = Env::default();

        assert_eq!(runner.tick(&mut env), None);
        let first = runner.tick(&mut env).expect("first finished");
        assert_eq!(first.description, "first");
        assert_eq!(first.state, TaskState::Completed);
        assert_eq!(first.ticks, 2);

        let second = runner.tick(&mut env).expect("second finished");
        assert_eq!(second.failure, Some(TaskFailure::Other("boom".into())));
        assert!(runner.is_empty());

        assert_eq!(reports.try_recv().map(|report| report.description), Ok("first".into()));
        assert_eq!(reports.try_recv().map(|report| report.state), Ok(TaskState::Failed));
    }

    #[test]
    fn unmet_precondition_waits_instead_of_failing() {
        let mut runner = TaskRunner::new(8);
        runner.push(Box::new(Countdown::new("gated", 1).gated()));
        let mut env = Env::default();

        for _ in 0..3 {
            assert_eq!(runner.tick(&mut env), None);
        }
        assert_eq!(runner.current().map(|task| task.state()), Some(TaskState::Pending));

        env.ready = true;
        let report = runner.tick(&mut env).expect("finished once ready");
        assert_eq!(report.state, TaskState::Completed);
        assert_eq!(report.ticks, 1);
    }

    #[test]
    fn cancelling_reports_the_head() {
        let mut runner: TaskRunner<Env> = TaskRunner::new(8);
        runner.push(Box::new(Countdown::new("long", 100)));
        runner.push(Box::new(Countdown::new("next", 1)));

        let report = runner.cancel_current().expect("head cancelled");
        assert_eq!(report.state, TaskState::Cancelled);
        assert_eq!(runner.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_drains_the_queue() {
        let mut runner = TaskRunner::new(8);
        runner.push(Box::new(Countdown::new("a", 3)));
        runner.push(Box::new(Countdown::new("b", 2)));
        let mut env = Env::default();

        let reports = runner
            .run(&mut env, &RunnerConfig::default(), std::future::pending())
            .await;

        let names: Vec<&str> = reports.iter().map(|report| report.description.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(runner.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_running_task() {
        let mut runner = TaskRunner::new(8);
        runner.push(Box::new(Countdown::new("endless", u32::MAX)));
        let mut env = Env::default();
        let config = RunnerConfig {
            tick_interval: Duration::from_millis(600),
            ..RunnerConfig::default()
        };

        let reports = runner
            .run(&mut env, &config, time::sleep(Duration::from_millis(1500)))
            .await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].state, TaskState::Cancelled);
        assert_eq!(reports[0].ticks, 3);
    }
}
