use std::sync::Arc;

use world_core::{CollisionSource, Target, WorldPoint};

use crate::{
    AdjacentPath, CollisionMap, LongRangeRouter, ObstacleRegistry, PathFinder, PathResult, Route,
    find_reachable_adjacent,
};

/// Path-finding service consumed by tasks.
pub trait Navigator: Send + Sync {
    /// Radius in tiles answered by local searches.
    fn local_range(&self) -> i32;

    /// Local tile path. With `obstacle_aware`, closed registered doors may be
    /// crossed and are reported on the result.
    fn find_path(&self, from: WorldPoint, to: WorldPoint, obstacle_aware: bool)
    -> Option<PathResult>;

    /// Cheapest route to a tile the target can be used from. Always
    /// obstacle-aware.
    fn find_reachable_adjacent(&self, from: WorldPoint, target: &Target) -> Option<AdjacentPath>;

    /// Route to any destination, falling back to the long-range router beyond
    /// local range.
    fn route(&self, from: WorldPoint, to: WorldPoint) -> Option<Route>;

    fn route_cost(&self, from: WorldPoint, to: WorldPoint) -> Option<u32> {
        self.route(from, to).map(|route| route.cost)
    }
}

/// [`Navigator`] backed by collision data and an optional waypoint router.
pub struct LocalNavigator {
    collision: Arc<dyn CollisionSource>,
    obstacles: Arc<ObstacleRegistry>,
    finder: PathFinder,
    router: Option<Arc<dyn LongRangeRouter>>,
}

impl LocalNavigator {
    pub fn new(collision: Arc<dyn CollisionSource>) -> Self {
        Self {
            collision,
            obstacles: Arc::new(ObstacleRegistry::new()),
            finder: PathFinder::default(),
            router: None,
        }
    }

    pub fn with_obstacles(mut self, obstacles: Arc<ObstacleRegistry>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn with_finder(mut self, finder: PathFinder) -> Self {
        self.finder = finder;
        self
    }

    pub fn with_router(mut self, router: Arc<dyn LongRangeRouter>) -> Self {
        self.router = Some(router);
        self
    }

    fn map(&self) -> CollisionMap<'_> {
        CollisionMap::new(self.collision.as_ref())
    }
}

impl Navigator for LocalNavigator {
    fn local_range(&self) -> i32 {
        self.finder.max_distance()
    }

    fn find_path(
        &self,
        from: WorldPoint,
        to: WorldPoint,
        obstacle_aware: bool,
    ) -> Option<PathResult> {
        let obstacles = obstacle_aware.then_some(self.obstacles.as_ref());
        self.finder.find_path(&self.map(), obstacles, from, to)
    }

    fn find_reachable_adjacent(&self, from: WorldPoint, target: &Target) -> Option<AdjacentPath> {
        find_reachable_adjacent(
            &self.finder,
            &self.map(),
            Some(self.obstacles.as_ref()),
            from,
            target,
        )
    }

    fn route(&self, from: WorldPoint, to: WorldPoint) -> Option<Route> {
        if from.chebyshev_distance(to) <= self.local_range()
            && let Some(path) = self.find_path(from, to, true)
        {
            return Some(Route {
                waypoints: path.tiles.into_iter().skip(1).collect(),
                cost: path.cost,
            });
        }
        self.router.as_ref()?.route(from, to)
    }
}
