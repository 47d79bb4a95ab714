//! Pose Geometry
//!
//! Pure 2D geometry shared by the motion-analysis engines:
//! - Joint-angle calculation with degenerate-input tolerance
//! - Left/right angle fusion for one-sided occlusion
//! - Body inclination and posture angles
//! - Boundary-inclusive polygon containment
//! - The per-frame pose landmark model

pub mod angles;
pub mod landmarks;
pub mod point;
pub mod polygon;

pub use angles::{
    fuse_sides, inclination_from_vertical, joint_angle, posture_angle,
    segment_angle_from_horizontal,
};
pub use landmarks::{Joint, Landmark, PoseSample, MIN_VISIBILITY};
pub use point::Point2;
pub use polygon::polygon_contains;
