//! Frame input contract

use chrono::{DateTime, Utc};

use person_tracking::PersonDetection;
use pose_geometry::PoseSample;

/// One person's detection and, when the estimator produced one, their pose
#[derive(Debug, Clone)]
pub struct PersonObservation {
    pub detection: PersonDetection,
    pub pose: Option<PoseSample>,
}

/// Everything the external vision stack produced for one frame.
///
/// A frame with no people is "no update" for every tracker, not an error.
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub timestamp: DateTime<Utc>,
    pub people: Vec<PersonObservation>,
}

/// Source of per-frame observations: the external capture plus
/// pose-estimation stack. `None` ends the stream.
pub trait PoseSource {
    fn next_frame(&mut self) -> Option<FrameInput>;
}
