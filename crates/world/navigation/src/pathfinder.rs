//! Bounded A* over the 8-connected tile grid.
//!
//! Every step costs one tick, diagonal or not, so the Chebyshev distance is an
//! admissible heuristic. Searches never leave a square of `max_distance` tiles
//! around the start and give up after `max_iterations` node expansions.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::trace;
use world_core::{Direction, WorldPoint};

use crate::{CollisionMap, ObstacleCrossing, ObstacleRegistry};

/// Local search radius in tiles.
pub const MAX_PATH_LENGTH: i32 = 100;

/// Node expansion budget per search.
pub const MAX_ITERATIONS: usize = 5000;

/// A walkable route found by [`PathFinder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    /// Tiles from the start (inclusive) to the goal (inclusive).
    pub tiles: Vec<WorldPoint>,
    pub cost: u32,
    /// Closed obstacles on the route, in walking order.
    pub crossings: Vec<ObstacleCrossing>,
}

impl PathResult {
    pub fn destination(&self) -> Option<WorldPoint> {
        self.tiles.last().copied()
    }

    pub fn first_crossing(&self) -> Option<&ObstacleCrossing> {
        self.crossings.first()
    }
}

/// Node in the A* open set.
#[derive(Debug, Clone, Copy)]
struct PathNode {
    tile: WorldPoint,
    g_cost: u32,
    f_cost: u32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.g_cost == other.g_cost
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; deeper nodes first on ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug)]
struct Edge {
    previous: WorldPoint,
    crossing: Option<ObstacleCrossing>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathFinder {
    max_distance: i32,
    max_iterations: usize,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self {
            max_distance: MAX_PATH_LENGTH,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_distance(mut self, max_distance: i32) -> Self {
        self.max_distance = max_distance.max(1);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_distance(&self) -> i32 {
        self.max_distance
    }

    /// Shortest path between two tiles.
    ///
    /// With `obstacles`, closed registered doors and gates count as passable
    /// edges at their traversal cost and are listed on the result.
    pub fn find_path(
        &self,
        map: &CollisionMap<'_>,
        obstacles: Option<&ObstacleRegistry>,
        from: WorldPoint,
        to: WorldPoint,
    ) -> Option<PathResult> {
        if from.chebyshev_distance(to) > self.max_distance {
            return None;
        }
        self.search(
            map,
            obstacles,
            from,
            |tile| tile == to,
            |tile| tile.chebyshev_distance(to).max(0) as u32,
        )
    }

    /// A* from `start` to the cheapest tile satisfying `is_goal`.
    ///
    /// `heuristic` must never overestimate the remaining cost.
    pub fn search<G, H>(
        &self,
        map: &CollisionMap<'_>,
        obstacles: Option<&ObstacleRegistry>,
        start: WorldPoint,
        is_goal: G,
        heuristic: H,
    ) -> Option<PathResult>
    where
        G: Fn(WorldPoint) -> bool,
        H: Fn(WorldPoint) -> u32,
    {
        if is_goal(start) {
            return Some(PathResult {
                tiles: vec![start],
                cost: 0,
                crossings: Vec::new(),
            });
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<WorldPoint, Edge> = HashMap::new();
        let mut g_scores: HashMap<WorldPoint, u32> = HashMap::new();

        g_scores.insert(start, 0);
        open_set.push(PathNode {
            tile: start,
            g_cost: 0,
            f_cost: heuristic(start),
        });

        let mut iterations = 0usize;
        while let Some(current) = open_set.pop() {
            iterations += 1;
            if iterations > self.max_iterations {
                trace!(%start, iterations, "path search exhausted iteration budget");
                return None;
            }

            if is_goal(current.tile) {
                return Some(reconstruct_path(&came_from, current.tile, current.g_cost));
            }

            let best_g = g_scores.get(&current.tile).copied().unwrap_or(u32::MAX);
            if current.g_cost > best_g {
                continue; // Stale heap entry
            }

            for direction in Direction::ALL {
                let neighbor = current.tile.step(direction);
                if neighbor.chebyshev_distance(start) > self.max_distance {
                    continue;
                }

                let Some((step_cost, crossing)) =
                    self.step_cost(map, obstacles, current.tile, direction)
                else {
                    continue;
                };

                let tentative_g = current.g_cost + step_cost;
                let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);
                if tentative_g < neighbor_g {
                    came_from.insert(
                        neighbor,
                        Edge {
                            previous: current.tile,
                            crossing,
                        },
                    );
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        tile: neighbor,
                        g_cost: tentative_g,
                        f_cost: tentative_g + heuristic(neighbor),
                    });
                }
            }
        }

        None // No path found
    }

    fn step_cost(
        &self,
        map: &CollisionMap<'_>,
        obstacles: Option<&ObstacleRegistry>,
        from: WorldPoint,
        direction: Direction,
    ) -> Option<(u32, Option<ObstacleCrossing>)> {
        if map.can_move(from, direction) {
            return Some((1, None));
        }
        let registry = obstacles?;
        if !map.is_walkable(from.step(direction)) {
            return None;
        }
        let crossing = registry.crossing(map, from, direction)?;
        Some((1 + crossing.traversal_cost, Some(crossing)))
    }
}

fn reconstruct_path(
    came_from: &HashMap<WorldPoint, Edge>,
    goal: WorldPoint,
    cost: u32,
) -> PathResult {
    let mut tiles = vec![goal];
    let mut crossings = Vec::new();
    let mut current = goal;
    while let Some(edge) = came_from.get(&current) {
        if let Some(crossing) = &edge.crossing {
            crossings.push(crossing.clone());
        }
        tiles.push(edge.previous);
        current = edge.previous;
    }
    tiles.reverse();
    crossings.reverse();
    PathResult {
        tiles,
        cost,
        crossings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridCollision, ObstacleDefinition};
    use world_core::{BoundaryObject, EntityId, EntityKey};

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    /// Vertical wall along the west edge of x = 5 for y in 0..=10.
    fn walled_grid() -> GridCollision {
        let mut grid = GridCollision::new();
        for y in 0..=10 {
            grid.add_wall(p(5, y), Direction::West);
        }
        grid
    }

    #[test]
    fn straight_line_uses_chebyshev_cost() {
        let grid = GridCollision::new();
        let map = CollisionMap::new(&grid);

        let path = PathFinder::new()
            .find_path(&map, None, p(0, 0), p(4, 2))
            .expect("open field path");
        assert_eq!(path.cost, 4);
        assert_eq!(path.tiles.first(), Some(&p(0, 0)));
        assert_eq!(path.destination(), Some(p(4, 2)));
    }

    #[test]
    fn routes_around_wall() {
        let grid = walled_grid();
        let map = CollisionMap::new(&grid);

        let path = PathFinder::new()
            .find_path(&map, None, p(3, 5), p(7, 5))
            .expect("detour around the wall end");
        assert!(path.cost > 4);
        for pair in path.tiles.windows(2) {
            let direction = pair[0].direction_to(pair[1]).expect("contiguous path");
            assert!(map.can_move(pair[0], direction));
        }
    }

    #[test]
    fn respects_search_radius() {
        let grid = walled_grid();
        let map = CollisionMap::new(&grid);

        let finder = PathFinder::new().with_max_distance(5);
        assert!(finder.find_path(&map, None, p(3, 5), p(7, 5)).is_none());
        assert!(finder.find_path(&map, None, p(0, 0), p(9, 0)).is_none());
    }

    #[test]
    fn obstacle_aware_search_reports_crossing() {
        let mut grid = walled_grid();
        let door_tile = p(5, 5);
        grid.remove_wall(door_tile, Direction::West);
        grid.add_boundary(BoundaryObject {
            key: EntityKey(40),
            id: EntityId(1530),
            tile: door_tile,
            side: Direction::West,
        });
        let map = CollisionMap::new(&grid);
        let registry =
            ObstacleRegistry::new().with(ObstacleDefinition::door("Door").closed([EntityId(1530)]));

        let finder = PathFinder::new().with_max_distance(5);
        assert!(finder.find_path(&map, None, p(3, 5), p(7, 5)).is_none());

        let path = finder
            .find_path(&map, Some(&registry), p(3, 5), p(7, 5))
            .expect("door is crossable");
        let crossing = path.first_crossing().expect("crossing reported");
        assert_eq!(crossing.from, p(4, 5));
        assert_eq!(crossing.to, door_tile);
        assert_eq!(path.cost, 4 + crossing.traversal_cost);
    }
}
