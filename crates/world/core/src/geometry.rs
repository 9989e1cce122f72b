use std::fmt;

/// Tile coordinate in the game world. `plane` is the floor level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
}

impl WorldPoint {
    pub const ORIGIN: Self = Self {
        x: 0,
        y: 0,
        plane: 0,
    };

    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Tile-grid distance where diagonal steps cost the same as cardinal ones.
    ///
    /// Points on different planes are never close: the distance saturates to
    /// `i32::MAX`.
    pub fn chebyshev_distance(self, other: WorldPoint) -> i32 {
        if self.plane != other.plane {
            return i32::MAX;
        }
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            plane: self.plane,
        }
    }

    #[inline]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Direction of a single step from `self` to `other`, if they are neighbours.
    pub fn direction_to(self, other: WorldPoint) -> Option<Direction> {
        if self.plane != other.plane {
            return None;
        }
        Direction::from_delta(other.x - self.x, other.y - self.y)
    }
}

impl Default for WorldPoint {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// One of the eight grid directions. North is `+y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Self::ALL.into_iter().find(|dir| dir.delta() == (dx, dy))
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// Splits a diagonal into its horizontal and vertical components.
    ///
    /// Returns `None` for cardinal directions.
    pub fn components(self) -> Option<(Direction, Direction)> {
        let (dx, dy) = self.delta();
        if dx == 0 || dy == 0 {
            return None;
        }
        let horizontal = if dx > 0 {
            Direction::East
        } else {
            Direction::West
        };
        let vertical = if dy > 0 {
            Direction::North
        } else {
            Direction::South
        };
        Some((horizontal, vertical))
    }
}

/// Pixel coordinate on the client canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Axis-aligned pixel rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.right() && point.y < self.bottom()
    }

    /// True when `other` lies entirely within `self`.
    pub fn contains_rect(&self, other: &ScreenRect) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersection(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = ScreenRect::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chebyshev_treats_diagonals_as_single_steps() {
        let a = WorldPoint::new(3200, 3200, 0);
        assert_eq!(a.chebyshev_distance(a.offset(3, -2)), 3);
        assert_eq!(a.chebyshev_distance(a.offset(-1, -1)), 1);
        assert_eq!(
            a.chebyshev_distance(WorldPoint::new(3200, 3200, 1)),
            i32::MAX
        );
    }

    #[test]
    fn diagonal_components_recombine() {
        for dir in Direction::ALL {
            match dir.components() {
                Some((h, v)) => {
                    let (hx, hy) = h.delta();
                    let (vx, vy) = v.delta();
                    assert_eq!((hx + vx, hy + vy), dir.delta());
                }
                None => assert!(!dir.is_diagonal()),
            }
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn rect_containment_and_intersection() {
        let viewport = ScreenRect::new(0, 0, 800, 600);
        let inside = ScreenRect::new(100, 100, 40, 40);
        let straddling = ScreenRect::new(780, 580, 40, 40);

        assert!(viewport.contains_rect(&inside));
        assert!(!viewport.contains_rect(&straddling));
        assert_eq!(
            viewport.intersection(&straddling),
            Some(ScreenRect::new(780, 580, 20, 20))
        );
        assert_eq!(viewport.intersection(&ScreenRect::new(900, 0, 5, 5)), None);
        assert!(!viewport.contains(ScreenPoint::new(800, 10)));
    }
}
