//! Synchronous per-frame analysis pipeline

use chrono::{DateTime, Utc};
use serde::Serialize;

use alerting::AlertDispatcher;
use exercise_engine::{
    EventSink, ExerciseCoordinator, MachineUpdate, SessionStats,
};
use person_tracking::{CentroidTracker, PersonDetection};
use pose_geometry::PoseSample;
use surveillance::{FrameReport, SurveillanceEngine, SurveillanceSummary};

use crate::settings::PipelineConfig;
use crate::source::FrameInput;

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub timestamp: DateTime<Utc>,
    /// People assigned an identity this frame
    pub people_seen: usize,
    pub exercise_updates: Vec<MachineUpdate>,
    pub surveillance: FrameReport,
}

/// Owns the trackers and engines and processes frames one at a time.
///
/// All state here belongs exclusively to the processing thread; readers only
/// ever see the snapshots the worker publishes.
pub struct AnalysisPipeline {
    tracker: CentroidTracker,
    coordinator: ExerciseCoordinator,
    surveillance: SurveillanceEngine,
}

impl AnalysisPipeline {
    /// Build a pipeline from configuration, forwarding surveillance alerts
    /// through a cooldown dispatcher tagged with the session id
    pub fn new(config: &PipelineConfig, session_id: &str, started_at: DateTime<Utc>) -> Self {
        let dispatcher = AlertDispatcher::new(config.dispatcher.clone());
        let mut surveillance = SurveillanceEngine::new(
            config.surveillance.clone(),
            Box::new(dispatcher),
            session_id,
        );
        for record in &config.zones {
            surveillance.add_zone(record.clone().into());
        }

        Self {
            tracker: CentroidTracker::new(config.tracker.clone()),
            coordinator: ExerciseCoordinator::new(config.engine.clone(), started_at),
            surveillance,
        }
    }

    /// Register an exercise lifecycle event subscriber
    pub fn add_event_sink(&mut self, sink: Box<dyn EventSink + Send>) {
        self.coordinator.add_sink(sink);
    }

    /// Process one frame: assign identities, feed each person's pose to the
    /// exercise coordinator, then run the surveillance pass over all poses
    pub fn process(&mut self, frame: &FrameInput) -> FrameSummary {
        let detections: Vec<PersonDetection> = frame
            .people
            .iter()
            .map(|person| person.detection.clone())
            .collect();
        let assignments = self.tracker.update_indexed(&detections);

        let mut exercise_updates = Vec::new();
        for (&person_id, &idx) in &assignments {
            if let Some(pose) = frame.people[idx].pose.as_ref() {
                exercise_updates.push(self.coordinator.update_person(
                    person_id,
                    pose,
                    frame.timestamp,
                ));
            }
        }

        let poses: Vec<PoseSample> = frame
            .people
            .iter()
            .filter_map(|person| person.pose.clone())
            .collect();
        let surveillance = self.surveillance.process_frame(&poses, frame.timestamp);

        FrameSummary {
            timestamp: frame.timestamp,
            people_seen: assignments.len(),
            exercise_updates,
            surveillance,
        }
    }

    /// Exercise stats snapshot
    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        self.coordinator.aggregate_stats(now)
    }

    /// Surveillance summary snapshot
    pub fn surveillance_summary(&self, now: DateTime<Utc>) -> SurveillanceSummary {
        self.surveillance.summary(now)
    }

    /// Coordinator access for session-level operations
    pub fn coordinator_mut(&mut self) -> &mut ExerciseCoordinator {
        &mut self.coordinator
    }

    /// Surveillance engine access for zone management and alert review
    pub fn surveillance_mut(&mut self) -> &mut SurveillanceEngine {
        &mut self.surveillance
    }

    /// Start a fresh session: zero the exercise counters (identities are
    /// preserved) and clear the surveillance session data
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.coordinator.reset(now);
        self.surveillance.reset_session();
    }
}
