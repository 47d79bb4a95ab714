//! 2D point type

use serde::{Deserialize, Serialize};

/// 2D point in pixel coordinates (y grows downward, image convention)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between two points
    pub fn midpoint(a: Point2, b: Point2) -> Point2 {
        Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }
}
