//! Walking by minimap clicks.
//!
//! The route comes from the local path finder when the destination is in
//! range, otherwise from the long-range router. Each click targets the
//! farthest upcoming tile that is still on the minimap. A closed door on the
//! local path ends the leg in front of it; the door is opened through a
//! sub-task and the route is planned again.
use std::collections::VecDeque;
use std::time::Duration;

use navigation::{Navigator, ObstacleCrossing};
use task_tree::{
    Deadline, Progress, SlotPoll, SubTaskOutcome, SubTaskSlot, Supervised, TaskBody, TaskFailure,
};
use tracing::{debug, trace, warn};
use world_core::WorldPoint;

use crate::context::TaskContext;
use crate::requests;
use crate::slot::{ActionKind, ActionPoll, ActionSlot};

use super::open_obstacle;

/// Tiles from the destination that count as arrived.
const ARRIVAL_DISTANCE: i32 = 2;
const MINIMAP_CLICK_DISTANCE: i32 = 15;
const MIN_TICKS_BETWEEN_CLICKS: u64 = 4;
/// Ticks without moving before the route is planned again.
const STUCK_THRESHOLD_TICKS: u32 = 8;
const MAX_REPATH_ATTEMPTS: u32 = 3;
const WALK_TIMEOUT: Duration = Duration::from_secs(120);

pub fn walk_to(destination: WorldPoint) -> Supervised<WalkTo> {
    Supervised::new(WalkTo::new(destination), Deadline::After(WALK_TIMEOUT))
}

struct Plan {
    waypoints: VecDeque<WorldPoint>,
    /// Door that ends this plan.
    crossing: Option<ObstacleCrossing>,
}

#[derive(Clone, Copy)]
struct LastClick {
    tick: u64,
    tile: WorldPoint,
}

pub struct WalkTo {
    destination: WorldPoint,
    description: String,
    plan: Option<Plan>,
    slot: ActionSlot<bool>,
    sub_task: SubTaskSlot<TaskContext>,
    last_click: Option<LastClick>,
    last_position: Option<WorldPoint>,
    idle_ticks: u32,
    repaths: u32,
    crossings: u32,
    ticks: u64,
}

impl WalkTo {
    pub fn new(destination: WorldPoint) -> Self {
        Self {
            destination,
            description: format!("Walk to {destination}"),
            plan: None,
            slot: ActionSlot::new(),
            sub_task: SubTaskSlot::new(),
            last_click: None,
            last_position: None,
            idle_ticks: 0,
            repaths: 0,
            crossings: 0,
            ticks: 0,
        }
    }

    pub fn destination(&self) -> WorldPoint {
        self.destination
    }

    fn plan(&self, navigator: &dyn Navigator, from: WorldPoint) -> Option<Plan> {
        if from.chebyshev_distance(self.destination) <= navigator.local_range()
            && let Some(path) = navigator.find_path(from, self.destination, true)
        {
            let crossing = path.crossings.into_iter().next();
            return Some(Plan {
                waypoints: leg(path.tiles, crossing.as_ref()),
                crossing,
            });
        }
        navigator.route(from, self.destination).map(|route| Plan {
            waypoints: route.waypoints.into(),
            crossing: None,
        })
    }

    /// Splits a coarse waypoint that is off the minimap into walkable tiles.
    fn expand_leg(plan: &mut Plan, navigator: &dyn Navigator, player: WorldPoint) {
        let Some(&next) = plan.waypoints.front() else {
            return;
        };
        if next.chebyshev_distance(player) <= MINIMAP_CLICK_DISTANCE {
            return;
        }
        let Some(path) = navigator.find_path(player, next, true) else {
            return;
        };
        let crossing = path.crossings.into_iter().next();
        let tiles = leg(path.tiles, crossing.as_ref());
        if crossing.is_some() {
            plan.waypoints = tiles;
            plan.crossing = crossing;
            return;
        }
        plan.waypoints.pop_front();
        for tile in tiles.into_iter().rev() {
            plan.waypoints.push_front(tile);
        }
    }

    fn click_due(&self, player: WorldPoint) -> bool {
        match self.last_click {
            None => true,
            Some(click) => {
                self.ticks.saturating_sub(click.tick) >= MIN_TICKS_BETWEEN_CLICKS
                    && (click.tile.chebyshev_distance(player) <= 3 || self.idle_ticks >= 2)
            }
        }
    }

    fn track_movement(&mut self, player: WorldPoint) {
        if self.last_position == Some(player) {
            self.idle_ticks += 1;
        } else {
            self.idle_ticks = 0;
            self.last_position = Some(player);
        }
    }

    fn release(&mut self) {
        self.slot.detach();
        self.sub_task.cancel();
    }
}

impl TaskBody<TaskContext> for WalkTo {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, ctx: &mut TaskContext) -> Progress {
        self.ticks += 1;

        match self.sub_task.drive(ctx) {
            SlotPoll::Running => return Progress::Continue,
            SlotPoll::Finished(outcome) => {
                if let SubTaskOutcome::Failed(failure) = &outcome {
                    debug!(task = %self.description, %failure, "obstacle not cleared");
                }
                self.plan = None;
                self.last_click = None;
                self.idle_ticks = 0;
            }
            SlotPoll::Idle => {}
        }

        match self.slot.poll() {
            ActionPoll::Pending(_) => return Progress::Continue,
            ActionPoll::Ready(_, Err(err)) => {
                return Progress::Fail(TaskFailure::ActionRejected(err.to_string()));
            }
            ActionPoll::Ready(_, Ok(_)) | ActionPoll::Idle => {}
        }

        let Some(player) = ctx.world().player_position() else {
            return Progress::Fail(TaskFailure::Other(
                "player position unavailable".to_string(),
            ));
        };
        if player.chebyshev_distance(self.destination) <= ARRIVAL_DISTANCE {
            debug!(task = %self.description, %player, "arrived");
            return Progress::Complete;
        }

        self.track_movement(player);
        if self.idle_ticks >= STUCK_THRESHOLD_TICKS {
            self.repaths += 1;
            if self.repaths > MAX_REPATH_ATTEMPTS {
                return Progress::Fail(TaskFailure::TargetUnreachable(format!(
                    "stuck at {player} walking to {}",
                    self.destination
                )));
            }
            warn!(
                task = %self.description,
                %player,
                attempt = self.repaths,
                max = MAX_REPATH_ATTEMPTS,
                "not moving, planning again"
            );
            self.plan = None;
            self.last_click = None;
            self.idle_ticks = 0;
        }

        if self.plan.is_none() {
            let Some(plan) = self.plan(ctx.navigator(), player) else {
                return Progress::Fail(TaskFailure::TargetUnreachable(format!(
                    "no route to {}",
                    self.destination
                )));
            };
            debug!(
                task = %self.description,
                waypoints = plan.waypoints.len(),
                door = ?plan.crossing.as_ref().map(|crossing| &crossing.name),
                "route planned"
            );
            self.plan = Some(plan);
        }
        let due = self.click_due(player);
        let Some(plan) = self.plan.as_mut() else {
            return Progress::Continue;
        };

        // Drop everything up to the last waypoint the player is standing by.
        if let Some(reached) = plan
            .waypoints
            .iter()
            .rposition(|waypoint| waypoint.chebyshev_distance(player) <= 1)
        {
            plan.waypoints.drain(..=reached);
        }
        Self::expand_leg(plan, ctx.navigator(), player);

        if plan.waypoints.is_empty() {
            let crossing = plan.crossing.take();
            self.plan = None;
            let Some(crossing) = crossing else {
                return Progress::Continue;
            };

            self.crossings += 1;
            let max = ctx.config().max_obstacle_attempts;
            if self.crossings > max {
                return Progress::Fail(TaskFailure::ObstacleUnresolved {
                    name: crossing.name,
                    attempts: max,
                });
            }
            debug!(task = %self.description, obstacle = %crossing.name, "opening obstacle on route");
            let task = open_obstacle(&crossing, ctx.config().obstacle_search_radius);
            if let Err(err) = self.sub_task.start(Box::new(task)) {
                return Progress::Fail(TaskFailure::Other(err.to_string()));
            }
            return Progress::Continue;
        }

        if !due {
            trace!(task = %self.description, %player, "walking");
            return Progress::Continue;
        }

        let world = ctx.world();
        let choice = plan
            .waypoints
            .iter()
            .take_while(|waypoint| waypoint.chebyshev_distance(player) <= MINIMAP_CLICK_DISTANCE)
            .filter_map(|waypoint| world.minimap_point(*waypoint).map(|point| (*waypoint, point)))
            .last()
            .or_else(|| {
                // Next waypoint is off the minimap and could not be expanded
                plan.waypoints.front().and_then(|waypoint| {
                    let tile = toward(player, *waypoint, MINIMAP_CLICK_DISTANCE);
                    world.minimap_point(tile).map(|point| (tile, point))
                })
            });
        let Some((tile, point)) = choice else {
            trace!(task = %self.description, "no route tile on the minimap");
            return Progress::Continue;
        };

        debug!(task = %self.description, %tile, remaining = plan.waypoints.len(), "minimap click");
        let future = requests::walk_click(ctx.actions(), point);
        if let Err(err) = self.slot.issue(ActionKind::Walk, future) {
            return Progress::Fail(TaskFailure::ActionRejected(err.to_string()));
        }
        self.last_click = Some(LastClick {
            tick: self.ticks,
            tile,
        });

        match self.slot.poll() {
            ActionPoll::Ready(_, Err(err)) => {
                Progress::Fail(TaskFailure::ActionRejected(err.to_string()))
            }
            _ => Progress::Continue,
        }
    }

    fn reset(&mut self) {
        self.release();
        *self = Self::new(self.destination);
    }

    fn abandon(&mut self) {
        self.release();
    }
}

/// Path tiles after the start, cut at the tile in front of `crossing`.
fn leg(tiles: Vec<WorldPoint>, crossing: Option<&ObstacleCrossing>) -> VecDeque<WorldPoint> {
    let mut tiles: VecDeque<WorldPoint> = tiles.into_iter().skip(1).collect();
    if let Some(crossing) = crossing {
        match tiles.iter().position(|tile| *tile == crossing.from) {
            Some(index) => tiles.truncate(index + 1),
            // The player already stands in front of it
            None => tiles.clear(),
        }
    }
    tiles
}

/// Point at most `max` tiles from `from` in the direction of `to`.
fn toward(from: WorldPoint, to: WorldPoint, max: i32) -> WorldPoint {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let distance = dx.abs().max(dy.abs());
    if distance <= max {
        return to;
    }
    from.offset(dx * max / distance, dy * max / distance)
}
