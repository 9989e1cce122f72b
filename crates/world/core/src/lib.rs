//! Observation model shared by the interaction engine.
//!
//! Everything here describes the game world as the bot sees it: tile and
//! screen geometry, interactable targets, collision data, and the read-only
//! [`WorldSnapshot`] port the engine queries every tick. Nothing in this crate
//! mutates the world; answers may be stale by the time they are used.
//!
//! - [`geometry`]: [`WorldPoint`], [`Direction`], [`ScreenPoint`], [`ScreenRect`]
//! - [`ids`]: entity, animation and widget identifiers
//! - [`target`]: [`Target`] descriptors and [`TargetQuery`]
//! - [`collision`]: [`CollisionFlags`] and the [`CollisionSource`] port
//! - [`snapshot`]: the [`WorldSnapshot`] port
pub mod collision;
pub mod geometry;
pub mod ids;
pub mod snapshot;
pub mod target;

pub use collision::{BoundaryObject, CollisionFlags, CollisionSource};
pub use geometry::{Direction, ScreenPoint, ScreenRect, WorldPoint};
pub use ids::{AnimationId, EntityId, EntityKey, WidgetGroupId};
pub use snapshot::WorldSnapshot;
pub use target::{Footprint, Target, TargetKind, TargetQuery};
