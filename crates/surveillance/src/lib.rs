//! Surveillance Engine
//!
//! Spatial analysis of tracked people from per-frame pose observations:
//! - Greedy nearest-track identity matching over raw positions
//! - Restricted-zone containment with enter/exit transition detection
//! - Speed, loitering, and posture-based fall heuristics
//! - A single alert funnel with bounded history and per-type counters,
//!   forwarding to a rate-limited alert sink

pub mod config;
pub mod engine;
pub mod movement;
pub mod track;
pub mod zone;

pub use config::SurveillanceConfig;
pub use engine::{FrameReport, SurveillanceEngine, SurveillanceSummary};
pub use movement::MovementAnalyzer;
pub use track::{PersonTrack, PoseFeatures, TimedPosition};
pub use zone::{parse_zones, RestrictedZone, ZoneId, ZoneRecord};

use thiserror::Error;

/// Surveillance error types
#[derive(Error, Debug)]
pub enum SurveillanceError {
    #[error("zone configuration parse failed: {0}")]
    ZoneConfig(#[from] serde_json::Error),
}
