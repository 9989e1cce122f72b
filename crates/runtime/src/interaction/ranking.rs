//! Candidate ranking for FIND_TARGET.
//!
//! Candidates are ordered by, in turn: reachable before unreachable, lower
//! path cost, on screen before off screen, and shorter straight-line
//! distance. Path cost comes from the adjacency search for nearby
//! candidates and from the long-range router beyond local range, so a tree
//! behind a fence never wins over one slightly farther away in the open.
use navigation::{AdjacentPath, Navigator};
use task_tree::TaskFailure;
use tracing::trace;
use world_core::{Target, WorldPoint};

/// Candidates considered per discovery, nearest first.
const MAX_CANDIDATES: usize = 8;

/// The chosen candidate.
#[derive(Clone, Debug)]
pub struct Selection {
    pub target: Target,
    /// Route to an interaction tile, when within local range.
    pub path: Option<AdjacentPath>,
    /// Beyond local range; must be walked to before adjacency is known.
    pub approach: bool,
}

struct Ranked {
    target: Target,
    path: Option<AdjacentPath>,
    cost: Option<u32>,
    distance: i32,
    far: bool,
}

impl Ranked {
    fn key(&self) -> (bool, u32, bool, i32) {
        (
            self.cost.is_none(),
            self.cost.unwrap_or(u32::MAX),
            !self.target.is_visible(),
            self.distance,
        )
    }
}

/// Picks the best world candidate for a player standing on `player`.
pub fn select(
    navigator: &dyn Navigator,
    player: WorldPoint,
    candidates: Vec<Target>,
    describe: &str,
) -> Result<Selection, TaskFailure> {
    let mut nearby: Vec<(i32, Target)> = candidates
        .into_iter()
        .filter_map(|target| {
            let distance = footprint_distance(&target, player)?;
            Some((distance, target))
        })
        .collect();
    if nearby.is_empty() {
        return Err(TaskFailure::TargetNotFound(describe.to_string()));
    }
    nearby.sort_by_key(|(distance, _)| *distance);
    nearby.truncate(MAX_CANDIDATES);

    let local_range = navigator.local_range();
    let best = nearby
        .into_iter()
        .map(|(distance, target)| {
            if distance <= local_range {
                let path = navigator.find_reachable_adjacent(player, &target);
                let cost = path.as_ref().map(|path| path.cost);
                Ranked {
                    target,
                    path,
                    cost,
                    distance,
                    far: false,
                }
            } else {
                let cost = target
                    .position
                    .and_then(|position| navigator.route_cost(player, position));
                Ranked {
                    target,
                    path: None,
                    cost,
                    distance,
                    far: true,
                }
            }
        })
        .inspect(|ranked| {
            trace!(
                target = %ranked.target.name,
                key = %ranked.target.key,
                cost = ?ranked.cost,
                distance = ranked.distance,
                visible = ranked.target.is_visible(),
                "ranked candidate"
            );
        })
        .min_by_key(Ranked::key)
        .ok_or_else(|| TaskFailure::TargetNotFound(describe.to_string()))?;

    if best.cost.is_none() {
        return Err(TaskFailure::TargetUnreachable(format!(
            "{} at {}",
            best.target.name,
            best.target.position.unwrap_or_default()
        )));
    }

    Ok(Selection {
        target: best.target,
        path: best.path,
        approach: best.far,
    })
}

/// Picks the first candidate, for targets that need no path (inventory items).
pub fn first(candidates: Vec<Target>, describe: &str) -> Result<Selection, TaskFailure> {
    candidates
        .into_iter()
        .next()
        .map(|target| Selection {
            target,
            path: None,
            approach: false,
        })
        .ok_or_else(|| TaskFailure::TargetNotFound(describe.to_string()))
}

/// Chebyshev distance from `from` to the nearest tile of the target.
fn footprint_distance(target: &Target, from: WorldPoint) -> Option<i32> {
    target
        .occupied_tiles()
        .into_iter()
        .map(|tile| tile.chebyshev_distance(from))
        .min()
}
