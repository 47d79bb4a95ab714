//! Person Tracking
//!
//! Assigns stable integer identities to per-frame person detections:
//! - Greedy nearest-centroid matching with a distance cap
//! - Missing-frame eviction policy
//! - Monotonic, never-reused ids
//!
//! Ids stay stable as long as a person's centroid moves less than the
//! matching distance between consecutive frames and they are not missing
//! longer than the eviction window. No guarantee is made under occlusion
//! crossings between two nearby people (greedy, not globally optimal).

pub mod detection;
pub mod tracker;

pub use detection::{BoundingBox, PersonDetection};
pub use tracker::{CentroidTracker, TrackedPerson, TrackerConfig};

/// Stable person identifier, monotonically assigned and never reused
pub type PersonId = u64;
