//! Engine configuration

use serde::{Deserialize, Serialize};

/// Exercise engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Samples kept in the angle smoothing window (frames)
    pub smoothing_window: usize,
    /// Consecutive frames a candidate phase must persist before committing
    pub min_state_duration: u32,
    /// Switch exercise kind automatically from body geometry
    pub auto_detect: bool,
    /// Seconds without a completed rep before explicit eviction removes a person
    pub inactive_timeout_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            min_state_duration: 3,
            auto_detect: false,
            inactive_timeout_secs: 30.0,
        }
    }
}
