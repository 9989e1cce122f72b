//! Engine configuration.
//!
//! Every tunable has a default and may be overridden from the environment.
//! Unset or unparsable variables keep the default.
use std::env;
use std::time::Duration;

use navigation::PathFinder;

/// Interaction tunables shared by every task built from one context.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Target search radius in tiles.
    pub search_radius: i32,
    /// Ticks WAIT_RESPONSE waits for a success signal.
    pub interaction_timeout_ticks: u32,
    /// Post-discovery despawns tolerated before the task fails.
    pub max_despawn_retries: u32,
    /// Times an NPC may walk away before the task gives up on it.
    pub max_retarget_attempts: u32,
    /// Tiles an NPC may move from where it was found before re-targeting.
    pub max_npc_movement: i32,
    /// Door or gate handling attempts per target.
    pub max_obstacle_attempts: u32,
    /// Search radius for the door or gate itself.
    pub obstacle_search_radius: i32,
    /// Walks toward a distant target before it counts as unreachable.
    pub max_approach_attempts: u32,
    /// Default task timeout.
    pub task_timeout: Duration,
    /// Local path search radius in tiles.
    pub local_nav_distance: i32,
    pub click_point: ClickPointConfig,
    pub humanization: HumanizationProfile,
}

impl EngineConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ENGINE_SEARCH_RADIUS` - Target search radius in tiles (default: 15)
    /// - `ENGINE_INTERACTION_TIMEOUT_TICKS` - Response wait budget (default: 10)
    /// - `ENGINE_MAX_DESPAWN_RETRIES` - Despawn retry bound (default: 3)
    /// - `ENGINE_TASK_TIMEOUT_SECS` - Task timeout in seconds (default: 30)
    /// - `ENGINE_LOCAL_NAV_DISTANCE` - Local search radius in tiles (default: 100)
    /// - plus the variables read by [`HumanizationProfile::from_env`]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(radius) = read_env::<i32>("ENGINE_SEARCH_RADIUS") {
            config.search_radius = radius.max(1);
        }
        if let Some(ticks) = read_env::<u32>("ENGINE_INTERACTION_TIMEOUT_TICKS") {
            config.interaction_timeout_ticks = ticks.max(1);
        }
        if let Some(retries) = read_env::<u32>("ENGINE_MAX_DESPAWN_RETRIES") {
            config.max_despawn_retries = retries;
        }
        if let Some(secs) = read_env::<u64>("ENGINE_TASK_TIMEOUT_SECS") {
            config.task_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(distance) = read_env::<i32>("ENGINE_LOCAL_NAV_DISTANCE") {
            config.local_nav_distance = distance.max(1);
        }
        config.humanization = HumanizationProfile::from_env();

        config
    }

    /// Local path finder bounded by [`local_nav_distance`](Self::local_nav_distance).
    pub fn path_finder(&self) -> PathFinder {
        PathFinder::new().with_max_distance(self.local_nav_distance)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_radius: 15,
            interaction_timeout_ticks: 10,
            max_despawn_retries: 3,
            max_retarget_attempts: 3,
            max_npc_movement: 3,
            max_obstacle_attempts: 3,
            obstacle_search_radius: 5,
            max_approach_attempts: 3,
            task_timeout: Duration::from_secs(30),
            local_nav_distance: navigation::MAX_PATH_LENGTH,
            click_point: ClickPointConfig::default(),
            humanization: HumanizationProfile::default(),
        }
    }
}

/// How long MOVE_POINTER waits for a usable clickbox.
#[derive(Clone, Debug)]
pub struct ClickPointConfig {
    /// Ticks to wait for a clickbox before giving up on this camera angle.
    pub max_wait_ticks: u32,
    /// Wait tick at which a camera rotation is requested.
    pub rotation_trigger_tick: u32,
    /// Camera rotations before the target counts as unclickable.
    pub max_camera_retries: u32,
}

impl Default for ClickPointConfig {
    fn default() -> Self {
        Self {
            max_wait_ticks: 8,
            rotation_trigger_tick: 3,
            max_camera_retries: 3,
        }
    }
}

/// Randomization ranges for humanized input.
#[derive(Clone, Debug)]
pub struct HumanizationProfile {
    pub hover_delay_min: Duration,
    pub hover_delay_max: Duration,
    /// Probability of rotating the camera after a target is found.
    pub camera_rotation_chance: f64,
    /// Fixed seed for reproducible runs. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl HumanizationProfile {
    /// Environment variables:
    /// - `ENGINE_HOVER_DELAY_MIN_MS` (default: 100)
    /// - `ENGINE_HOVER_DELAY_MAX_MS` (default: 400)
    /// - `ENGINE_CAMERA_ROTATION_CHANCE` in `[0, 1]` (default: 0.3)
    /// - `ENGINE_HUMANIZATION_SEED` (default: unset)
    pub fn from_env() -> Self {
        let mut profile = Self::default();

        if let Some(ms) = read_env::<u64>("ENGINE_HOVER_DELAY_MIN_MS") {
            profile.hover_delay_min = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("ENGINE_HOVER_DELAY_MAX_MS") {
            profile.hover_delay_max = Duration::from_millis(ms);
        }
        if profile.hover_delay_max < profile.hover_delay_min {
            profile.hover_delay_max = profile.hover_delay_min;
        }
        if let Some(chance) = read_env::<f64>("ENGINE_CAMERA_ROTATION_CHANCE") {
            profile.camera_rotation_chance = chance.clamp(0.0, 1.0);
        }
        profile.seed = read_env::<u64>("ENGINE_HUMANIZATION_SEED");

        profile
    }
}

impl Default for HumanizationProfile {
    fn default() -> Self {
        Self {
            hover_delay_min: Duration::from_millis(100),
            hover_delay_max: Duration::from_millis(400),
            camera_rotation_chance: 0.3,
            seed: None,
        }
    }
}

/// Settings for the async tick loop.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub tick_interval: Duration,
    /// Capacity of the task report broadcast channel.
    pub report_capacity: usize,
}

impl RunnerConfig {
    /// Environment variables:
    /// - `ENGINE_TICK_INTERVAL_MS` (default: 600)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("ENGINE_TICK_INTERVAL_MS") {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }

        config
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(600),
            report_capacity: 64,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_finder_is_bounded_by_local_nav_distance() {
        let mut config = EngineConfig::default();
        assert_eq!(config.path_finder().max_distance(), navigation::MAX_PATH_LENGTH);

        config.local_nav_distance = 12;
        assert_eq!(config.path_finder().max_distance(), 12);
    }
}
