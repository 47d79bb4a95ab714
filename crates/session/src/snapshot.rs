//! Shared session snapshot

use chrono::{DateTime, Utc};
use serde::Serialize;

use exercise_engine::SessionStats;
use surveillance::SurveillanceSummary;

/// Digest of the most recently processed frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDigest {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub people_seen: usize,
}

/// The state shared across the worker/reader boundary: the latest frame
/// digest, the stats snapshots, and the session identifier. Everything else
/// stays owned by the processing thread.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub frames_processed: u64,
    pub last_frame: Option<FrameDigest>,
    pub exercise: SessionStats,
    pub surveillance: SurveillanceSummary,
}

impl SessionSnapshot {
    /// Empty snapshot for a session that has not processed a frame yet
    pub fn new(session_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            started_at,
            frames_processed: 0,
            last_frame: None,
            exercise: SessionStats {
                total_reps: 0,
                active_people: 0,
                avg_reps_per_person: 0.0,
                best_performer: None,
                best_rep_count: 0,
                session_duration_secs: 0.0,
            },
            surveillance: SurveillanceSummary::default(),
        }
    }
}
