//! Per-frame person detections

use serde::{Deserialize, Serialize};

use pose_geometry::Point2;

/// Axis-aligned bounding box, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center point of the box
    pub fn centroid(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A person detected in a single frame.
///
/// Ephemeral: produced fresh each frame by the external detector and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetection {
    pub bbox: BoundingBox,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl PersonDetection {
    /// Create a new detection
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }

    /// Derived centroid used for identity matching
    pub fn centroid(&self) -> Point2 {
        self.bbox.centroid()
    }
}
