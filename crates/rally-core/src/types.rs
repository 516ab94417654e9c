//! Core types used throughout the Rally engine
//!
//! The world is a ground plane. A `Vec2` always holds `(x, z)`: its `y`
//! component is the world Z axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position and heading of the moving reference point (the anchor)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Ground-plane position `(x, z)`
    pub position: Vec2,
    /// Heading in degrees, clockwise seen from above, 0 = +Z
    pub heading: f32,
}

impl Pose {
    /// Create a pose, normalizing the heading into [0, 360)
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading: normalize_heading(heading),
        }
    }

    /// Unit direction the heading points at
    pub fn forward(&self) -> Vec2 {
        let radians = self.heading.to_radians();
        Vec2::new(radians.sin(), radians.cos())
    }
}

/// Wrap an angle in degrees into [0, 360)
pub fn normalize_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Integer cell index on a regular ground-plane grid
///
/// Cells are identified by index, never by their floating-point center, so
/// they hash and compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub z: i32,
}

impl GridCoord {
    pub const ORIGIN: GridCoord = GridCoord { x: 0, z: 0 };

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The cell whose center is nearest to a grid-local position
    pub fn nearest(local: Vec2, cell: Vec2) -> Self {
        Self {
            x: (local.x / cell.x).round() as i32,
            z: (local.y / cell.y).round() as i32,
        }
    }

    /// Grid-local center of this cell
    pub fn center(&self, cell: Vec2) -> Vec2 {
        Vec2::new(self.x as f32 * cell.x, self.z as f32 * cell.y)
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// This cell followed by its 8 neighbors:
    /// north, south, east, west, north-east, north-west, south-east, south-west
    pub fn neighborhood(&self) -> [GridCoord; 9] {
        [
            *self,
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(1, 1),
            self.offset(-1, 1),
            self.offset(1, -1),
            self.offset(-1, -1),
        ]
    }

    /// Chebyshev distance in cells
    pub fn chebyshev(&self, other: &GridCoord) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.z - other.z).unsigned_abs())
    }

    /// Euclidean distance between the two cell centers
    pub fn distance(&self, other: &GridCoord, cell: Vec2) -> f32 {
        self.center(cell).distance(other.center(cell))
    }
}

/// Edge-triggered move of the anchor into a neighboring cell
///
/// Diagonals are distinct transitions, so a simultaneous crossing on both
/// axes shifts once, diagonally, instead of twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Crossing {
    /// Classify the anchor's offset from its cell center.
    ///
    /// An axis crosses when its offset is strictly beyond `half`.
    pub fn detect(delta: Vec2, half: Vec2) -> Option<Crossing> {
        let east = delta.x > half.x;
        let west = delta.x < -half.x;
        let north = delta.y > half.y;
        let south = delta.y < -half.y;
        let x_inside = delta.x.abs() <= half.x;
        let z_inside = delta.y.abs() <= half.y;

        if north && x_inside {
            Some(Crossing::North)
        } else if east && z_inside {
            Some(Crossing::East)
        } else if south && x_inside {
            Some(Crossing::South)
        } else if west && z_inside {
            Some(Crossing::West)
        } else if north && east {
            Some(Crossing::NorthEast)
        } else if south && east {
            Some(Crossing::SouthEast)
        } else if south && west {
            Some(Crossing::SouthWest)
        } else if north && west {
            Some(Crossing::NorthWest)
        } else {
            None
        }
    }

    /// Cell step `(dx, dz)` for this transition
    pub fn step(self) -> (i32, i32) {
        match self {
            Crossing::North => (0, 1),
            Crossing::South => (0, -1),
            Crossing::East => (1, 0),
            Crossing::West => (-1, 0),
            Crossing::NorthEast => (1, 1),
            Crossing::NorthWest => (-1, 1),
            Crossing::SouthEast => (1, -1),
            Crossing::SouthWest => (-1, -1),
        }
    }

    pub fn apply(self, coord: GridCoord) -> GridCoord {
        let (dx, dz) = self.step();
        coord.offset(dx, dz)
    }
}

/// Axis-aligned rectangle on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, half_extent: Vec2) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Strict containment: points on the border are outside
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rounds_to_center() {
        let cell = Vec2::splat(20.0);
        assert_eq!(GridCoord::nearest(Vec2::new(9.9, -9.9), cell), GridCoord::ORIGIN);
        assert_eq!(GridCoord::nearest(Vec2::new(10.1, 0.0), cell), GridCoord::new(1, 0));
        assert_eq!(GridCoord::nearest(Vec2::new(-31.0, 45.0), cell), GridCoord::new(-2, 2));
    }

    #[test]
    fn test_neighborhood_is_unique_and_centered() {
        let center = GridCoord::new(3, -4);
        let cells = center.neighborhood();
        assert_eq!(cells[0], center);
        for (i, a) in cells.iter().enumerate() {
            assert!(a.chebyshev(&center) <= 1);
            for b in &cells[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_crossing_orthogonal_and_diagonal() {
        let half = Vec2::splat(10.0);
        assert_eq!(Crossing::detect(Vec2::new(0.0, 10.5), half), Some(Crossing::North));
        assert_eq!(Crossing::detect(Vec2::new(-10.5, 3.0), half), Some(Crossing::West));
        assert_eq!(Crossing::detect(Vec2::new(10.5, -10.5), half), Some(Crossing::SouthEast));
        assert_eq!(Crossing::detect(Vec2::new(-11.0, 11.0), half), Some(Crossing::NorthWest));
        assert_eq!(Crossing::detect(Vec2::new(10.0, -10.0), half), None);
        assert_eq!(Crossing::detect(Vec2::new(4.0, 2.0), half), None);
    }

    #[test]
    fn test_diagonal_shifts_once() {
        let next = Crossing::NorthEast.apply(GridCoord::ORIGIN);
        assert_eq!(next, GridCoord::new(1, 1));
    }

    #[test]
    fn test_rect_contains_is_strict() {
        let rect = Rect::from_center(Vec2::ZERO, Vec2::new(2.0, 1.0));
        assert!(rect.contains(Vec2::new(1.9, 0.9)));
        assert!(!rect.contains(Vec2::new(2.0, 0.0)));
        assert!(!rect.contains(Vec2::new(0.0, -1.5)));
        assert_eq!(rect.max - rect.min, Vec2::new(4.0, 2.0));
    }

    #[test]
    fn test_heading_normalization() {
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        let pose = Pose::new(Vec2::ZERO, 90.0);
        assert!((pose.forward() - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }
}
