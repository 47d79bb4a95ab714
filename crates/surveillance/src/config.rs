//! Surveillance configuration

use serde::{Deserialize, Serialize};

/// Surveillance engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveillanceConfig {
    /// Maximum distance for matching an observation to an existing track (pixels)
    pub match_distance: f64,
    /// Speed above which a rapid-movement alert fires (pixels/second)
    pub speed_threshold: f64,
    /// Positional variance below which a person counts as stationary (pixels^2)
    pub loitering_variance: f64,
    /// Minimum stationary time span before a loitering alert fires (seconds)
    pub loitering_time_secs: f64,
    /// Posture angle from vertical above which a fall alert fires (degrees)
    pub fall_angle_threshold: f64,
    /// Positions kept per track
    pub max_positions: usize,
    /// Pose-feature summaries kept per track
    pub max_pose_history: usize,
    /// Alerts kept in the in-memory history
    pub max_alerts_in_memory: usize,
    /// How recently a track must have been seen to count as active (seconds)
    pub active_window_secs: f64,
}

impl Default for SurveillanceConfig {
    fn default() -> Self {
        Self {
            match_distance: 100.0,
            speed_threshold: 300.0,
            loitering_variance: 1000.0,
            loitering_time_secs: 30.0,
            fall_angle_threshold: 45.0,
            max_positions: 50,
            max_pose_history: 20,
            max_alerts_in_memory: 100,
            active_window_secs: 2.0,
        }
    }
}
