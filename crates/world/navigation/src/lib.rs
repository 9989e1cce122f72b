//! Reachability services for the interaction engine.
//!
//! Local movement is answered by an 8-connected A* over client collision
//! flags ([`PathFinder`]), bounded to a radius around the player. Interaction
//! targets are approached through [`find_reachable_adjacent`], which searches
//! for any walkable tile touching the target footprint. Registered doors and
//! gates ([`ObstacleRegistry`]) may be crossed in obstacle-aware mode; the
//! first crossing is reported so callers can open it before moving on.
//! Destinations beyond the local bound are costed by a [`LongRangeRouter`].
//!
//! [`Navigator`] bundles these behind one object-safe service.
pub mod collision;
pub mod grid;
pub mod navigator;
pub mod obstacles;
pub mod pathfinder;
pub mod reachability;
pub mod router;

pub use collision::CollisionMap;
pub use grid::GridCollision;
pub use navigator::{LocalNavigator, Navigator};
pub use obstacles::{ObstacleCrossing, ObstacleDefinition, ObstacleKind, ObstacleRegistry};
pub use pathfinder::{MAX_ITERATIONS, MAX_PATH_LENGTH, PathFinder, PathResult};
pub use reachability::{AdjacentPath, can_interact_from, find_reachable_adjacent};
pub use router::{LongRangeRouter, Route, WaypointGraph};
