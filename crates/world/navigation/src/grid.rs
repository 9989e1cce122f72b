//! In-memory collision map.

use std::collections::HashMap;

use world_core::{BoundaryObject, CollisionFlags, CollisionSource, Direction, EntityKey, WorldPoint};

/// Sparse collision grid. Tiles without an entry are open floor.
///
/// A bounded grid reports tiles outside its bounds as unloaded.
#[derive(Clone, Debug, Default)]
pub struct GridCollision {
    tiles: HashMap<WorldPoint, CollisionFlags>,
    boundaries: HashMap<WorldPoint, Vec<BoundaryObject>>,
    bounds: Option<(WorldPoint, WorldPoint)>,
}

impl GridCollision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid limited to the inclusive rectangle between `min` and `max` on
    /// `min.plane`.
    pub fn bounded(min: WorldPoint, max: WorldPoint) -> Self {
        Self {
            bounds: Some((min, max)),
            ..Self::default()
        }
    }

    pub fn in_bounds(&self, tile: WorldPoint) -> bool {
        match self.bounds {
            Some((min, max)) => {
                tile.plane == min.plane
                    && tile.x >= min.x
                    && tile.y >= min.y
                    && tile.x <= max.x
                    && tile.y <= max.y
            }
            None => true,
        }
    }

    pub fn set_flags(&mut self, tile: WorldPoint, flags: CollisionFlags) {
        if flags.is_empty() {
            self.tiles.remove(&tile);
        } else {
            self.tiles.insert(tile, flags);
        }
    }

    pub fn insert_flags(&mut self, tile: WorldPoint, flags: CollisionFlags) {
        self.tiles.entry(tile).or_default().insert(flags);
    }

    pub fn remove_flags(&mut self, tile: WorldPoint, flags: CollisionFlags) {
        if let Some(existing) = self.tiles.get_mut(&tile) {
            existing.remove(flags);
            if existing.is_empty() {
                self.tiles.remove(&tile);
            }
        }
    }

    /// Marks the tile as occupied by a solid object.
    pub fn block(&mut self, tile: WorldPoint) {
        self.insert_flags(tile, CollisionFlags::OBJECT);
    }

    /// Places a wall on the `side` edge of `tile`, mirrored onto the neighbour.
    pub fn add_wall(&mut self, tile: WorldPoint, side: Direction) {
        self.insert_flags(tile, CollisionFlags::wall(side));
        self.insert_flags(tile.step(side), CollisionFlags::wall(side.opposite()));
    }

    pub fn remove_wall(&mut self, tile: WorldPoint, side: Direction) {
        self.remove_flags(tile, CollisionFlags::wall(side));
        self.remove_flags(tile.step(side), CollisionFlags::wall(side.opposite()));
    }

    /// Places a door-like object together with the wall it closes.
    pub fn add_boundary(&mut self, object: BoundaryObject) {
        self.add_wall(object.tile, object.side);
        self.boundaries.entry(object.tile).or_default().push(object);
    }

    /// Removes a boundary object and opens its edge.
    pub fn remove_boundary(&mut self, key: EntityKey) -> Option<BoundaryObject> {
        let mut removed = None;
        for objects in self.boundaries.values_mut() {
            if let Some(index) = objects.iter().position(|object| object.key == key) {
                removed = Some(objects.remove(index));
                break;
            }
        }
        let object = removed?;
        self.boundaries.retain(|_, objects| !objects.is_empty());
        self.remove_wall(object.tile, object.side);
        Some(object)
    }
}

impl CollisionSource for GridCollision {
    fn flags(&self, tile: WorldPoint) -> Option<CollisionFlags> {
        if !self.in_bounds(tile) {
            return None;
        }
        Some(self.tiles.get(&tile).copied().unwrap_or_default())
    }

    fn boundary_objects(&self, tile: WorldPoint) -> Vec<BoundaryObject> {
        self.boundaries.get(&tile).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_core::EntityId;

    #[test]
    fn removing_boundary_reopens_edge() {
        let mut grid = GridCollision::new();
        let tile = WorldPoint::new(5, 3, 0);
        grid.add_boundary(BoundaryObject {
            key: EntityKey(1),
            id: EntityId(1530),
            tile,
            side: Direction::West,
        });

        assert!(grid.flags(tile).is_some_and(|f| f.has_wall(Direction::West)));
        assert_eq!(grid.boundary_objects(tile).len(), 1);

        let removed = grid.remove_boundary(EntityKey(1));
        assert!(removed.is_some());
        assert_eq!(grid.flags(tile), Some(CollisionFlags::empty()));
        assert_eq!(
            grid.flags(tile.step(Direction::West)),
            Some(CollisionFlags::empty())
        );
        assert!(grid.boundary_objects(tile).is_empty());
    }
}
