//! Adjacency resolution for interaction targets.
//!
//! An interaction is only possible from a walkable tile that touches the
//! target footprint, orthogonally or diagonally, without a wall on the shared
//! edge. Boundary targets (doors, wall decorations) are usable from any
//! walkable tile at most one step from their tile, including their own tile.

use world_core::{Target, WorldPoint};

use crate::{CollisionMap, ObstacleCrossing, ObstacleRegistry, PathFinder};

/// Route from the actor to a tile adjacent to a target.
///
/// The destination is always walkable and touches the target footprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacentPath {
    /// Tiles from the actor's tile (inclusive) to the destination (inclusive).
    pub tiles: Vec<WorldPoint>,
    pub destination: WorldPoint,
    pub cost: u32,
    /// First closed obstacle on the route, if any.
    pub obstacle: Option<ObstacleCrossing>,
}

impl AdjacentPath {
    #[inline]
    pub fn crosses_obstacle(&self) -> bool {
        self.obstacle.is_some()
    }

    /// Number of steps to the destination.
    pub fn steps(&self) -> usize {
        self.tiles.len().saturating_sub(1)
    }
}

/// Distance from `tile` to the nearest tile of the target footprint.
fn footprint_distance(target: &Target, origin: WorldPoint, tile: WorldPoint) -> i32 {
    target
        .footprint
        .tiles(origin)
        .map(|occupied| occupied.chebyshev_distance(tile))
        .min()
        .unwrap_or(i32::MAX)
}

/// Whether the actor standing on `tile` can interact with `target`.
pub fn can_interact_from(map: &CollisionMap<'_>, tile: WorldPoint, target: &Target) -> bool {
    let Some(origin) = target.position else {
        return false;
    };
    if !map.is_walkable(tile) {
        return false;
    }

    if target.boundary {
        return footprint_distance(target, origin, tile) <= 1;
    }

    if target.footprint.contains(origin, tile) {
        return false;
    }
    target.footprint.tiles(origin).any(|occupied| {
        tile.direction_to(occupied)
            .is_some_and(|direction| !map.wall_between(tile, direction))
    })
}

/// Cheapest path from `from` to any tile the target can be used from.
///
/// Returns `None` when no such tile is reachable within the finder's radius.
/// With `obstacles`, the route may pass through closed registered doors; the
/// first one is reported on the result.
pub fn find_reachable_adjacent(
    finder: &PathFinder,
    map: &CollisionMap<'_>,
    obstacles: Option<&ObstacleRegistry>,
    from: WorldPoint,
    target: &Target,
) -> Option<AdjacentPath> {
    let origin = target.position?;
    if footprint_distance(target, origin, from) > finder.max_distance() + 1 {
        return None;
    }

    let path = finder.search(
        map,
        obstacles,
        from,
        |tile| can_interact_from(map, tile, target),
        |tile| {
            let distance = footprint_distance(target, origin, tile);
            distance.saturating_sub(1).max(0) as u32
        },
    )?;

    let destination = path.destination()?;
    Some(AdjacentPath {
        destination,
        cost: path.cost,
        obstacle: path.crossings.into_iter().next(),
        tiles: path.tiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridCollision, ObstacleDefinition};
    use world_core::{
        BoundaryObject, Direction, EntityId, EntityKey, Footprint, TargetKind,
    };

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    fn rock(at: WorldPoint, footprint: Footprint) -> Target {
        Target::new(EntityKey(1), EntityId(11364), TargetKind::Object, "Rocks")
            .at(at)
            .with_footprint(footprint)
    }

    fn grid_with_solid(target: &Target) -> GridCollision {
        let mut grid = GridCollision::new();
        for tile in target.occupied_tiles() {
            grid.block(tile);
        }
        grid
    }

    #[test]
    fn standing_next_to_target_needs_no_steps() {
        let target = rock(p(5, 5), Footprint::SINGLE);
        let grid = grid_with_solid(&target);
        let map = CollisionMap::new(&grid);

        let path = find_reachable_adjacent(&PathFinder::new(), &map, None, p(4, 4), &target)
            .expect("already adjacent");
        assert_eq!(path.steps(), 0);
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn destination_touches_large_footprint() {
        let target = rock(p(10, 10), Footprint::new(2, 3));
        let grid = grid_with_solid(&target);
        let map = CollisionMap::new(&grid);

        let path = find_reachable_adjacent(&PathFinder::new(), &map, None, p(0, 0), &target)
            .expect("open field");
        let origin = p(10, 10);
        assert!(!target.footprint.contains(origin, path.destination));
        assert!(target
            .occupied_tiles()
            .iter()
            .any(|tile| tile.chebyshev_distance(path.destination) == 1));
        assert_eq!(path.cost, 9);
    }

    #[test]
    fn enclosed_target_is_unreachable() {
        let target = rock(p(5, 5), Footprint::SINGLE);
        let mut grid = grid_with_solid(&target);
        for dx in -2i32..=2 {
            for dy in -2i32..=2 {
                if dx.abs() == 2 || dy.abs() == 2 {
                    grid.block(p(5 + dx, 5 + dy));
                }
            }
        }
        let map = CollisionMap::new(&grid);

        let finder = PathFinder::new().with_max_distance(20);
        assert!(find_reachable_adjacent(&finder, &map, None, p(0, 0), &target).is_none());
    }

    #[test]
    fn wall_on_shared_edge_prevents_interaction() {
        let target = rock(p(5, 5), Footprint::SINGLE);
        let mut grid = grid_with_solid(&target);
        grid.add_wall(p(5, 5), Direction::West);
        let map = CollisionMap::new(&grid);

        assert!(!can_interact_from(&map, p(4, 5), &target));
        assert!(can_interact_from(&map, p(6, 5), &target));
    }

    #[test]
    fn closed_door_is_reported_on_adjacent_path() {
        // Room east of a wall line at x = 5, door at (5, 3)
        let mut grid = GridCollision::new();
        for y in -20..=20 {
            if y != 3 {
                grid.add_wall(p(5, y), Direction::West);
            }
        }
        grid.add_boundary(BoundaryObject {
            key: EntityKey(77),
            id: EntityId(1530),
            tile: p(5, 3),
            side: Direction::West,
        });
        let target = rock(p(8, 3), Footprint::SINGLE);
        grid.block(p(8, 3));
        let map = CollisionMap::new(&grid);
        let registry =
            ObstacleRegistry::new().with(ObstacleDefinition::door("Door").closed([EntityId(1530)]));
        let finder = PathFinder::new().with_max_distance(15);

        assert!(find_reachable_adjacent(&finder, &map, None, p(2, 3), &target).is_none());

        let path = find_reachable_adjacent(&finder, &map, Some(&registry), p(2, 3), &target)
            .expect("path through the door");
        let obstacle = path.obstacle.expect("door crossing");
        assert_eq!(obstacle.object.key, EntityKey(77));
        assert_eq!(path.destination.chebyshev_distance(p(8, 3)), 1);
    }
}
