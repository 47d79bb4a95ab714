//! Pose landmark model
//!
//! A `PoseSample` is one person's set of named 2D joint positions for a single
//! frame, each with the visibility score reported by the (external) pose
//! estimator. Lookups below the visibility floor behave as "joint absent".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::point::Point2;

/// Visibility floor below which a landmark is treated as absent
pub const MIN_VISIBILITY: f64 = 0.5;

/// Named body joints consumed by the analysis engines
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// A single detected joint position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: Point2,
    /// Visibility/confidence in [0, 1] as reported by the pose estimator
    pub visibility: f64,
}

/// One person's landmarks for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    landmarks: BTreeMap<Joint, Landmark>,
}

impl PoseSample {
    /// Create an empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, convenient for tests and synthetic sources
    pub fn with_landmark(mut self, joint: Joint, position: Point2, visibility: f64) -> Self {
        self.insert(joint, Landmark { position, visibility });
        self
    }

    /// Insert or replace a landmark
    pub fn insert(&mut self, joint: Joint, landmark: Landmark) {
        self.landmarks.insert(joint, landmark);
    }

    /// Raw landmark access, ignoring the visibility floor
    pub fn landmark(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.get(&joint)
    }

    /// Position of a joint, or `None` when unreported or below the
    /// visibility floor
    pub fn point(&self, joint: Joint) -> Option<Point2> {
        self.landmarks
            .get(&joint)
            .filter(|lm| lm.visibility >= MIN_VISIBILITY)
            .map(|lm| lm.position)
    }

    /// Hip midpoint, tolerating one-sided occlusion
    pub fn hip_midpoint(&self) -> Option<Point2> {
        Self::side_midpoint(self.point(Joint::LeftHip), self.point(Joint::RightHip))
    }

    /// Shoulder midpoint, tolerating one-sided occlusion
    pub fn shoulder_midpoint(&self) -> Option<Point2> {
        Self::side_midpoint(
            self.point(Joint::LeftShoulder),
            self.point(Joint::RightShoulder),
        )
    }

    fn side_midpoint(left: Option<Point2>, right: Option<Point2>) -> Option<Point2> {
        match (left, right) {
            (Some(l), Some(r)) => Some(Point2::midpoint(l, r)),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        }
    }

    /// Number of stored landmarks
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// Whether the sample holds no landmarks at all
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}
