//! Choosing where to put the pointer.
//!
//! A target that just came into view may not have a clickbox yet, and one
//! near the edge of the viewport may be partially hidden. The resolver waits
//! for a usable clickbox, asks for camera rotations when waiting does not
//! help, and gives up after a bounded number of rotations.
use world_core::{ScreenPoint, ScreenRect, Target};

use crate::config::ClickPointConfig;
use crate::humanize::Humanizer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickPoint {
    Ready(ScreenPoint),
    /// No clickbox yet; try again next tick.
    Waiting,
    /// Rotate the camera toward the target, then try again.
    NeedsRotation,
    Unavailable(String),
}

/// Per-target wait and rotation counters.
#[derive(Clone, Debug, Default)]
pub struct ClickPointResolver {
    waited: u32,
    rotations: u32,
    last_counted_tick: Option<u64>,
}

impl ClickPointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn rotations(&self) -> u32 {
        self.rotations
    }

    /// Resolves a click point for `target` on tick `tick`.
    ///
    /// Waiting is counted at most once per tick, however often this is
    /// called within it.
    pub fn resolve(
        &mut self,
        tick: u64,
        target: &Target,
        viewport: ScreenRect,
        config: &ClickPointConfig,
        humanizer: &mut Humanizer,
    ) -> ClickPoint {
        if let Some(clickbox) = target.clickbox {
            if target.position.is_none() || viewport.contains_rect(&clickbox) {
                self.waited = 0;
                return ClickPoint::Ready(humanizer.click_point(&clickbox));
            }

            if self.rotations < config.max_camera_retries {
                self.rotations += 1;
                self.waited = 0;
                return ClickPoint::NeedsRotation;
            }
            return match viewport.intersection(&clickbox) {
                Some(visible) => ClickPoint::Ready(humanizer.click_point(&visible)),
                None => ClickPoint::Unavailable(format!("{} is off screen", target.name)),
            };
        }

        if self.last_counted_tick != Some(tick) {
            self.last_counted_tick = Some(tick);
            self.waited += 1;
        }

        // Inventory items and widgets cannot be brought into view by the camera.
        if target.position.is_none() {
            if self.waited >= config.max_wait_ticks {
                return ClickPoint::Unavailable(format!("{} is not rendered", target.name));
            }
            return ClickPoint::Waiting;
        }

        if self.waited >= config.max_wait_ticks {
            if self.rotations < config.max_camera_retries {
                self.rotations += 1;
                self.waited = 0;
                return ClickPoint::NeedsRotation;
            }
            return ClickPoint::Unavailable(format!(
                "{} has no clickbox after {} camera rotations",
                target.name, self.rotations
            ));
        }

        if self.waited == config.rotation_trigger_tick && self.rotations < config.max_camera_retries {
            self.rotations += 1;
            return ClickPoint::NeedsRotation;
        }

        ClickPoint::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_core::{EntityId, EntityKey, TargetKind, WorldPoint};

    const VIEWPORT: ScreenRect = ScreenRect::new(0, 0, 800, 600);

    fn tree() -> Target {
        Target::new(EntityKey(1), EntityId(1276), TargetKind::Object, "Tree")
            .at(WorldPoint::new(3200, 3200, 0))
    }

    #[test]
    fn visible_clickbox_resolves_inside() {
        let mut resolver = ClickPointResolver::new();
        let mut humanizer = Humanizer::seeded(9);
        let clickbox = ScreenRect::new(380, 280, 40, 40);
        let target = tree().with_clickbox(clickbox);

        match resolver.resolve(1, &target, VIEWPORT, &ClickPointConfig::default(), &mut humanizer) {
            ClickPoint::Ready(point) => assert!(clickbox.contains(point)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_clickbox_waits_then_rotates_then_gives_up() {
        let config = ClickPointConfig::default();
        let mut resolver = ClickPointResolver::new();
        let mut humanizer = Humanizer::seeded(9);
        let target = tree();

        let mut outcomes = Vec::new();
        for tick in 1..=40 {
            let outcome = resolver.resolve(tick, &target, VIEWPORT, &config, &mut humanizer);
            let done = matches!(outcome, ClickPoint::Unavailable(_));
            outcomes.push(outcome);
            if done {
                break;
            }
        }

        assert_eq!(outcomes[0], ClickPoint::Waiting);
        assert_eq!(outcomes[2], ClickPoint::NeedsRotation); // Third waiting tick
        let rotations = outcomes
            .iter()
            .filter(|outcome| **outcome == ClickPoint::NeedsRotation)
            .count();
        assert_eq!(rotations, config.max_camera_retries as usize);
        assert!(matches!(outcomes.last(), Some(ClickPoint::Unavailable(_))));
    }

    #[test]
    fn waiting_counts_once_per_tick() {
        let config = ClickPointConfig::default();
        let mut resolver = ClickPointResolver::new();
        let mut humanizer = Humanizer::seeded(9);
        let target = tree();

        for _ in 0..10 {
            assert_eq!(
                resolver.resolve(1, &target, VIEWPORT, &config, &mut humanizer),
                ClickPoint::Waiting
            );
        }
    }

    #[test]
    fn partially_visible_clickbox_requests_rotation_first() {
        let mut resolver = ClickPointResolver::new();
        let mut humanizer = Humanizer::seeded(9);
        let target = tree().with_clickbox(ScreenRect::new(780, 100, 40, 40));

        assert_eq!(
            resolver.resolve(1, &target, VIEWPORT, &ClickPointConfig::default(), &mut humanizer),
            ClickPoint::NeedsRotation
        );
        assert_eq!(resolver.rotations(), 1);
    }
}
