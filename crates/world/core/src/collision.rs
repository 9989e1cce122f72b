//! Collision data exposed by the client for local pathfinding.

use bitflags::bitflags;

use crate::{Direction, EntityId, EntityKey, WorldPoint};

bitflags! {
    /// Per-tile movement restrictions.
    ///
    /// Wall bits describe the edge of *this* tile on the named side. A move
    /// between two neighbours is blocked by a wall bit on either tile.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionFlags: u16 {
        const WALL_NORTH      = 1 << 0;
        const WALL_EAST       = 1 << 1;
        const WALL_SOUTH      = 1 << 2;
        const WALL_WEST       = 1 << 3;
        const WALL_NORTH_EAST = 1 << 4;
        const WALL_SOUTH_EAST = 1 << 5;
        const WALL_SOUTH_WEST = 1 << 6;
        const WALL_NORTH_WEST = 1 << 7;
        /// Tile occupied by a solid object.
        const OBJECT          = 1 << 8;
        /// Floor cannot be stood on (water, void).
        const FLOOR           = 1 << 9;
        /// Tile is fully blocked regardless of cause.
        const FULL            = 1 << 10;
    }
}

impl CollisionFlags {
    const SOLID: Self = Self::OBJECT.union(Self::FLOOR).union(Self::FULL);

    /// Wall bit guarding the edge of a tile facing `direction`.
    pub const fn wall(direction: Direction) -> Self {
        match direction {
            Direction::North => Self::WALL_NORTH,
            Direction::East => Self::WALL_EAST,
            Direction::South => Self::WALL_SOUTH,
            Direction::West => Self::WALL_WEST,
            Direction::NorthEast => Self::WALL_NORTH_EAST,
            Direction::SouthEast => Self::WALL_SOUTH_EAST,
            Direction::SouthWest => Self::WALL_SOUTH_WEST,
            Direction::NorthWest => Self::WALL_NORTH_WEST,
        }
    }

    /// True when nothing may stand on the tile.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.intersects(Self::SOLID)
    }

    #[inline]
    pub fn has_wall(self, direction: Direction) -> bool {
        self.contains(Self::wall(direction))
    }
}

/// An edge-aligned object such as a door or gate.
///
/// `side` is the edge of `tile` the object sits on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryObject {
    pub key: EntityKey,
    pub id: EntityId,
    pub tile: WorldPoint,
    pub side: Direction,
}

impl BoundaryObject {
    /// True when this object sits on the edge crossed by stepping from
    /// `from` in `direction`.
    pub fn guards(&self, from: WorldPoint, direction: Direction) -> bool {
        let to = from.step(direction);
        (self.tile == from && self.side == direction)
            || (self.tile == to && self.side == direction.opposite())
    }
}

/// Collision data provider.
pub trait CollisionSource: Send + Sync {
    /// Flags for `tile`, or `None` when the tile is not loaded.
    fn flags(&self, tile: WorldPoint) -> Option<CollisionFlags>;

    /// Boundary objects placed on any edge of `tile`.
    fn boundary_objects(&self, _tile: WorldPoint) -> Vec<BoundaryObject> {
        Vec::new()
    }
}
