//! Everything a task needs to observe and act on the world.
use std::sync::Arc;
use std::time::Duration;

use navigation::Navigator;
use task_tree::{TaskEnv, Timestamp};
use world_core::WorldSnapshot;

use crate::api::{ActionPort, Result, RuntimeError};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::humanize::Humanizer;

/// Per-actor execution context passed to every task tick.
pub struct TaskContext {
    world: Arc<dyn WorldSnapshot>,
    actions: Arc<dyn ActionPort>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    humanizer: Humanizer,
    config: EngineConfig,
}

impl TaskContext {
    pub fn builder() -> TaskContextBuilder {
        TaskContextBuilder::default()
    }

    #[inline]
    pub fn world(&self) -> &dyn WorldSnapshot {
        self.world.as_ref()
    }

    /// Shared handle to the action port, for building owned futures.
    #[inline]
    pub fn actions(&self) -> &Arc<dyn ActionPort> {
        &self.actions
    }

    #[inline]
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    #[inline]
    pub fn humanizer(&mut self) -> &mut Humanizer {
        &mut self.humanizer
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl TaskEnv for TaskContext {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(self.config.task_timeout)
    }
}

/// Builder for [`TaskContext`].
#[derive(Default)]
pub struct TaskContextBuilder {
    world: Option<Arc<dyn WorldSnapshot>>,
    actions: Option<Arc<dyn ActionPort>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
    humanizer: Option<Humanizer>,
    config: EngineConfig,
}

impl TaskContextBuilder {
    pub fn world(mut self, world: Arc<dyn WorldSnapshot>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn actions(mut self, actions: Arc<dyn ActionPort>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Defaults to a [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a humanizer built from the config's profile.
    pub fn humanizer(mut self, humanizer: Humanizer) -> Self {
        self.humanizer = Some(humanizer);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<TaskContext> {
        let world = self.world.ok_or(RuntimeError::MissingWorld)?;
        let actions = self.actions.ok_or(RuntimeError::MissingActions)?;
        let navigator = self.navigator.ok_or(RuntimeError::MissingNavigator)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        let humanizer = self
            .humanizer
            .unwrap_or_else(|| Humanizer::from_profile(&self.config.humanization));

        Ok(TaskContext {
            world,
            actions,
            navigator,
            clock,
            humanizer,
            config: self.config,
        })
    }
}
