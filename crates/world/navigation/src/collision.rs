//! Movement rules over raw collision flags.

use world_core::{BoundaryObject, CollisionFlags, CollisionSource, Direction, WorldPoint};

/// Borrowed view of a [`CollisionSource`] answering movement questions.
///
/// Unloaded tiles are treated as fully blocked.
#[derive(Clone, Copy)]
pub struct CollisionMap<'a> {
    source: &'a dyn CollisionSource,
}

impl<'a> CollisionMap<'a> {
    pub fn new(source: &'a dyn CollisionSource) -> Self {
        Self { source }
    }

    pub fn flags(&self, tile: WorldPoint) -> CollisionFlags {
        self.source.flags(tile).unwrap_or(CollisionFlags::FULL)
    }

    #[inline]
    pub fn is_walkable(&self, tile: WorldPoint) -> bool {
        !self.flags(tile).is_solid()
    }

    /// True when a wall sits on the edge between `from` and its neighbour in
    /// `direction`.
    pub fn wall_between(&self, from: WorldPoint, direction: Direction) -> bool {
        let to = from.step(direction);
        self.flags(from).has_wall(direction) || self.flags(to).has_wall(direction.opposite())
    }

    /// Whether a single step from `from` in `direction` is legal.
    ///
    /// Diagonal steps additionally require both cardinal detours to be open,
    /// so corners of walls and solid tiles cannot be cut.
    pub fn can_move(&self, from: WorldPoint, direction: Direction) -> bool {
        let to = from.step(direction);
        if !self.is_walkable(to) || self.wall_between(from, direction) {
            return false;
        }

        match direction.components() {
            None => true,
            Some((horizontal, vertical)) => {
                let side_h = from.step(horizontal);
                let side_v = from.step(vertical);
                self.is_walkable(side_h)
                    && self.is_walkable(side_v)
                    && !self.wall_between(from, horizontal)
                    && !self.wall_between(from, vertical)
                    && !self.wall_between(side_h, vertical)
                    && !self.wall_between(side_v, horizontal)
            }
        }
    }

    /// Boundary objects sitting on the edge crossed by stepping from `from`
    /// in `direction`.
    pub fn boundaries_on_edge(&self, from: WorldPoint, direction: Direction) -> Vec<BoundaryObject> {
        let to = from.step(direction);
        self.source
            .boundary_objects(from)
            .into_iter()
            .chain(self.source.boundary_objects(to))
            .filter(|object| object.guards(from, direction))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridCollision;

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    #[test]
    fn walls_block_both_directions() {
        let mut grid = GridCollision::new();
        grid.add_wall(p(1, 1), Direction::North);
        let map = CollisionMap::new(&grid);

        assert!(!map.can_move(p(1, 1), Direction::North));
        assert!(!map.can_move(p(1, 2), Direction::South));
        assert!(map.can_move(p(1, 1), Direction::East));
    }

    #[test]
    fn diagonal_cannot_cut_solid_corner() {
        let mut grid = GridCollision::new();
        grid.block(p(1, 0));
        let map = CollisionMap::new(&grid);

        assert!(!map.can_move(p(0, 0), Direction::NorthEast));
        assert!(map.can_move(p(0, 0), Direction::North));
        assert!(map.can_move(p(0, 1), Direction::East));
    }

    #[test]
    fn unloaded_tiles_are_solid() {
        let grid = GridCollision::bounded(p(0, 0), p(3, 3));
        let map = CollisionMap::new(&grid);

        assert!(map.is_walkable(p(3, 3)));
        assert!(!map.is_walkable(p(4, 3)));
        assert!(!map.can_move(p(3, 3), Direction::East));
    }
}
