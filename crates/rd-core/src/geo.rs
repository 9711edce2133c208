//! World-space position and axis-aligned rectangle types.
//!
//! The world is a right-handed `x, y, z` space with `y` up.  Route engines
//! search in the `x/z` ground plane and carry `y` through for rendering and
//! height queries.

use std::fmt;

/// A point in world space stored as single-precision floats.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the ground plane (`y = 0`).
    #[inline]
    pub const fn ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Full 3-D Euclidean distance.
    #[inline]
    pub fn distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance projected onto the `x/z` ground plane.  This is the metric
    /// route engines use for goal radii and waypoint advancement.
    #[inline]
    pub fn distance_2d(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Axis-aligned rectangle on the `x/z` ground plane, inclusive on all edges.
///
/// Used to describe the footprint of a terrain change.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl Rect {
    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_z: a.z.min(b.z),
            max_x: a.x.max(b.x),
            max_z: a.z.max(b.z),
        }
    }

    /// `true` if `pos` lies inside (or on the border of) the rectangle.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.z >= self.min_z && pos.z <= self.max_z
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_z: self.min_z - margin,
            max_x: self.max_x + margin,
            max_z: self.max_z + margin,
        }
    }
}
