//! Exercise phase state machine
//!
//! One instance per (person, exercise kind). Each update takes the person's
//! pose sample for the frame, smooths the measured joint angle over a bounded
//! window, advances the debounced phase machine, scores form, and reports rep
//! completions. Frames with no valid reading hold the previous state; they
//! never reset the smoothing window.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use person_tracking::PersonId;
use pose_geometry::PoseSample;

use crate::config::EngineConfig;
use crate::profile::{ExerciseKind, ExerciseProfile, QualityRule};

/// Position within a rep's motion cycle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExercisePhase {
    #[default]
    Unknown,
    /// Extended rest posture (standing tall, top of a push-up, arm extended)
    Standing,
    Descending,
    /// Contracted extreme of the rep
    Bottom,
    Ascending,
}

/// Depth assessment at the bottom of a rep
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DepthQuality {
    #[default]
    Unknown,
    Good,
    Shallow,
    TooDeep,
}

/// Minimum angle reached during one completed rep.
///
/// Appended to the rep history exactly once per completed rep and immutable
/// afterward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    pub min_angle: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result of one state-machine update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineUpdate {
    pub person_id: PersonId,
    pub kind: ExerciseKind,
    pub phase: ExercisePhase,
    pub smoothed_angle: Option<f64>,
    pub rep_count: u32,
    pub depth_quality: DepthQuality,
    /// Running form score, clamped to [60, 100]
    pub form_score: f64,
    pub confidence: f64,
    /// Set on the frame a rep completes
    pub rep_completed: Option<RepRecord>,
    /// Set on the frame a phase change commits (from, to)
    pub phase_changed: Option<(ExercisePhase, ExercisePhase)>,
}

const FORM_SCORE_MAX: f64 = 100.0;
const FORM_SCORE_MIN: f64 = 60.0;

/// Debounced exercise state machine for a single person and kind
pub struct ExerciseStateMachine {
    person_id: PersonId,
    profile: ExerciseProfile,
    config: EngineConfig,

    window: VecDeque<f64>,
    smoothed: Option<f64>,
    prev_smoothed: Option<f64>,

    phase: ExercisePhase,
    candidate: Option<ExercisePhase>,
    candidate_frames: u32,

    rep_count: u32,
    min_angle_in_rep: Option<f64>,
    best_depth: Option<f64>,
    rep_history: Vec<RepRecord>,
    last_rep_time: Option<DateTime<Utc>>,

    form_score: f64,
    depth_quality: DepthQuality,
    confidence: f64,
}

impl ExerciseStateMachine {
    /// Create a machine with the default profile for a kind
    pub fn new(person_id: PersonId, kind: ExerciseKind, config: EngineConfig) -> Self {
        Self::with_profile(person_id, ExerciseProfile::for_kind(kind), config)
    }

    /// Create a machine with an explicit profile
    pub fn with_profile(
        person_id: PersonId,
        profile: ExerciseProfile,
        config: EngineConfig,
    ) -> Self {
        Self {
            person_id,
            profile,
            config,
            window: VecDeque::new(),
            smoothed: None,
            prev_smoothed: None,
            phase: ExercisePhase::Unknown,
            candidate: None,
            candidate_frames: 0,
            rep_count: 0,
            min_angle_in_rep: None,
            best_depth: None,
            rep_history: Vec::new(),
            last_rep_time: None,
            form_score: FORM_SCORE_MAX,
            depth_quality: DepthQuality::Unknown,
            confidence: 0.0,
        }
    }

    /// Process one frame's pose sample
    pub fn update(&mut self, sample: &PoseSample, now: DateTime<Utc>) -> MachineUpdate {
        let measured = self.ingest_angle(sample);
        let phase_changed = self.advance_phase();
        self.assess_quality(measured);
        let rep_completed = match phase_changed {
            Some((from, to)) => self.check_rep_completion(from, to, now),
            None => None,
        };

        MachineUpdate {
            person_id: self.person_id,
            kind: self.profile.kind,
            phase: self.phase,
            smoothed_angle: self.smoothed,
            rep_count: self.rep_count,
            depth_quality: self.depth_quality,
            form_score: self.form_score,
            confidence: self.confidence,
            rep_completed,
            phase_changed,
        }
    }

    /// Append a valid reading to the smoothing window; an invalid frame is
    /// skipped so sporadic missing data never resets the smoothing
    fn ingest_angle(&mut self, sample: &PoseSample) -> bool {
        let Some(angle) = self.profile.measure(sample) else {
            return false;
        };
        while self.window.len() >= self.config.smoothing_window.max(1) {
            self.window.pop_front();
        }
        self.window.push_back(angle);
        self.prev_smoothed = self.smoothed;
        self.smoothed = Some(self.window.iter().sum::<f64>() / self.window.len() as f64);
        self.confidence = self.profile.base_confidence;
        true
    }

    /// Advance the debounced phase machine; a candidate phase commits only
    /// after being the newly-computed phase for `min_state_duration`
    /// consecutive frames
    fn advance_phase(&mut self) -> Option<(ExercisePhase, ExercisePhase)> {
        let smoothed = self.smoothed?;
        let next = self.classify(smoothed);

        if next == self.phase {
            self.candidate = None;
            self.candidate_frames = 0;
            return None;
        }

        if self.candidate == Some(next) {
            self.candidate_frames += 1;
        } else {
            self.candidate = Some(next);
            self.candidate_frames = 1;
        }

        if self.candidate_frames >= self.config.min_state_duration {
            let from = self.phase;
            self.phase = next;
            self.candidate = None;
            self.candidate_frames = 0;
            return Some((from, next));
        }
        None
    }

    /// Phase from thresholds on the smoothed angle; the intermediate band is
    /// disambiguated by the previous committed phase and the trend of the
    /// last two smoothed samples
    fn classify(&self, angle: f64) -> ExercisePhase {
        if angle > self.profile.standing_threshold {
            return ExercisePhase::Standing;
        }
        if angle < self.profile.bottom_threshold {
            return ExercisePhase::Bottom;
        }

        match self.phase {
            ExercisePhase::Standing => ExercisePhase::Descending,
            ExercisePhase::Descending | ExercisePhase::Bottom => match self.prev_smoothed {
                Some(prev) if angle < prev => ExercisePhase::Descending,
                Some(_) => ExercisePhase::Ascending,
                None => ExercisePhase::Descending,
            },
            ExercisePhase::Ascending => ExercisePhase::Ascending,
            ExercisePhase::Unknown => ExercisePhase::Descending,
        }
    }

    fn assess_quality(&mut self, measured: bool) {
        let Some(smoothed) = self.smoothed else {
            return;
        };

        if self.phase == ExercisePhase::Bottom
            && self.min_angle_in_rep.map_or(true, |min| smoothed < min)
        {
            self.min_angle_in_rep = Some(smoothed);
        }

        match self.profile.quality {
            QualityRule::Depth { good_min, good_max } => {
                if self.phase != ExercisePhase::Bottom {
                    return;
                }
                if (good_min..=good_max).contains(&smoothed) {
                    self.depth_quality = DepthQuality::Good;
                    self.form_score = (self.form_score + 1.0).min(FORM_SCORE_MAX);
                } else if smoothed > good_max {
                    self.depth_quality = DepthQuality::Shallow;
                    self.form_score = (self.form_score - 2.0).max(FORM_SCORE_MIN);
                } else {
                    self.depth_quality = DepthQuality::TooDeep;
                    self.form_score = (self.form_score - 2.0).max(FORM_SCORE_MIN);
                }
            }
            QualityRule::Smoothness {
                steady_delta,
                jerky_delta,
            } => {
                if !measured {
                    return;
                }
                if let Some(prev) = self.prev_smoothed {
                    let delta = (smoothed - prev).abs();
                    if delta < steady_delta {
                        self.form_score = (self.form_score + 0.5).min(FORM_SCORE_MAX);
                    } else if delta > jerky_delta {
                        self.form_score = (self.form_score - 1.0).max(FORM_SCORE_MIN);
                    }
                }
            }
        }
    }

    /// A rep counts exactly on the committed Ascending -> Standing transition,
    /// provided a bottom minimum was recorded during the preceding rep
    fn check_rep_completion(
        &mut self,
        from: ExercisePhase,
        to: ExercisePhase,
        now: DateTime<Utc>,
    ) -> Option<RepRecord> {
        if from != ExercisePhase::Ascending || to != ExercisePhase::Standing {
            return None;
        }
        let min_angle = self.min_angle_in_rep.take()?;

        self.rep_count += 1;
        let record = RepRecord {
            min_angle,
            timestamp: now,
        };
        self.rep_history.push(record);
        if self.best_depth.map_or(true, |best| min_angle < best) {
            self.best_depth = Some(min_angle);
        }
        self.last_rep_time = Some(now);
        Some(record)
    }

    /// Exercise kind this machine measures
    pub fn kind(&self) -> ExerciseKind {
        self.profile.kind
    }

    /// Completed reps so far (only ever increases until reset)
    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Current committed phase
    pub fn phase(&self) -> ExercisePhase {
        self.phase
    }

    /// Latest smoothed angle, if any reading has arrived
    pub fn smoothed_angle(&self) -> Option<f64> {
        self.smoothed
    }

    /// Running form score in [60, 100]
    pub fn form_score(&self) -> f64 {
        self.form_score
    }

    /// Deepest recorded rep minimum
    pub fn best_depth(&self) -> Option<f64> {
        self.best_depth
    }

    /// Minimum angle per completed rep, oldest first
    pub fn rep_history(&self) -> &[RepRecord] {
        &self.rep_history
    }

    /// Time of the most recent completed rep
    pub fn last_rep_time(&self) -> Option<DateTime<Utc>> {
        self.last_rep_time
    }

    /// Reset all counters and state for a new session
    pub fn reset(&mut self) {
        self.window.clear();
        self.smoothed = None;
        self.prev_smoothed = None;
        self.phase = ExercisePhase::Unknown;
        self.candidate = None;
        self.candidate_frames = 0;
        self.rep_count = 0;
        self.min_angle_in_rep = None;
        self.best_depth = None;
        self.rep_history.clear();
        self.last_rep_time = None;
        self.form_score = FORM_SCORE_MAX;
        self.depth_quality = DepthQuality::Unknown;
        self.confidence = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pose_geometry::{Joint, Point2};
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    /// Sample whose left-knee angle is exactly `angle_deg`
    fn knee_sample(angle_deg: f64) -> PoseSample {
        let knee = Point2::new(100.0, 100.0);
        let ankle = Point2::new(100.0, 200.0);
        let rad = angle_deg.to_radians();
        let hip = Point2::new(100.0 + 100.0 * rad.sin(), 100.0 + 100.0 * rad.cos());
        PoseSample::new()
            .with_landmark(Joint::LeftHip, hip, 0.9)
            .with_landmark(Joint::LeftKnee, knee, 0.9)
            .with_landmark(Joint::LeftAnkle, ankle, 0.9)
    }

    /// Sample whose left-elbow angle is exactly `angle_deg`
    fn elbow_sample(angle_deg: f64) -> PoseSample {
        let elbow = Point2::new(100.0, 100.0);
        let wrist = Point2::new(100.0, 200.0);
        let rad = angle_deg.to_radians();
        let shoulder = Point2::new(100.0 + 100.0 * rad.sin(), 100.0 + 100.0 * rad.cos());
        PoseSample::new()
            .with_landmark(Joint::LeftShoulder, shoulder, 0.9)
            .with_landmark(Joint::LeftElbow, elbow, 0.9)
            .with_landmark(Joint::LeftWrist, wrist, 0.9)
    }

    /// Unsmoothed, undebounced config so each sample acts immediately
    fn immediate_config() -> EngineConfig {
        EngineConfig {
            smoothing_window: 1,
            min_state_duration: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_squat_rep_cycle() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());

        let sequence = [170.0, 150.0, 120.0, 95.0, 120.0, 150.0, 170.0];
        let mut phases = Vec::new();
        let mut final_update = None;
        for (i, &angle) in sequence.iter().enumerate() {
            let update = machine.update(&knee_sample(angle), at(i as i64));
            phases.push(update.phase);
            final_update = Some(update);
        }

        assert_eq!(
            phases,
            vec![
                ExercisePhase::Standing,
                ExercisePhase::Descending,
                ExercisePhase::Descending,
                ExercisePhase::Bottom,
                ExercisePhase::Ascending,
                ExercisePhase::Ascending,
                ExercisePhase::Standing,
            ]
        );

        let update = final_update.unwrap();
        assert_eq!(update.rep_count, 1);
        let rep = update.rep_completed.unwrap();
        assert!((rep.min_angle - 95.0).abs() < 1e-6);
        assert_eq!(machine.rep_history().len(), 1);
        assert_eq!(machine.best_depth(), Some(rep.min_angle));
    }

    #[test]
    fn test_no_rep_without_reaching_bottom() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());

        // Shallow bounce: never crosses the bottom threshold
        for (i, &angle) in [170.0, 150.0, 120.0, 150.0, 170.0].iter().enumerate() {
            machine.update(&knee_sample(angle), at(i as i64));
        }
        assert_eq!(machine.rep_count(), 0);
    }

    #[test]
    fn test_debounce_suppresses_single_frame_spike() {
        let config = EngineConfig {
            smoothing_window: 1,
            min_state_duration: 3,
            ..Default::default()
        };
        let mut machine = ExerciseStateMachine::new(1, ExerciseKind::Squat, config);

        for i in 0..5 {
            machine.update(&knee_sample(170.0), at(i));
        }
        assert_eq!(machine.phase(), ExercisePhase::Standing);

        // One noisy frame deep below the bottom threshold, then recovery
        let spike = machine.update(&knee_sample(90.0), at(5));
        assert!(spike.phase_changed.is_none());
        assert_eq!(spike.phase, ExercisePhase::Standing);

        let recovered = machine.update(&knee_sample(170.0), at(6));
        assert_eq!(recovered.phase, ExercisePhase::Standing);
        assert_eq!(machine.rep_count(), 0);
    }

    #[test]
    fn test_missing_frames_hold_state_without_resetting_window() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());

        machine.update(&knee_sample(170.0), at(0));
        let before = machine.smoothed_angle();

        // A frame with no usable landmarks is "no update"
        let held = machine.update(&PoseSample::new(), at(1));
        assert_eq!(held.smoothed_angle, before);
        assert_eq!(held.phase, ExercisePhase::Standing);
        assert!(held.phase_changed.is_none());
    }

    #[test]
    fn test_smoothing_is_mean_of_window() {
        let config = EngineConfig {
            smoothing_window: 3,
            min_state_duration: 1,
            ..Default::default()
        };
        let mut machine = ExerciseStateMachine::new(1, ExerciseKind::Squat, config);

        machine.update(&knee_sample(170.0), at(0));
        machine.update(&knee_sample(160.0), at(1));
        let update = machine.update(&knee_sample(150.0), at(2));
        assert!((update.smoothed_angle.unwrap() - 160.0).abs() < 1e-6);
    }

    #[test]
    fn test_form_score_clamped() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());

        // Good depth frames can never push the score above 100
        for i in 0..50 {
            machine.update(&knee_sample(95.0), at(i));
        }
        assert!(machine.form_score() <= 100.0);

        // Bad depth frames bottom out at 60
        for i in 50..150 {
            machine.update(&knee_sample(70.0), at(i));
        }
        assert!((machine.form_score() - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_depth_quality_labels() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());

        let update = machine.update(&knee_sample(95.0), at(0));
        assert_eq!(update.depth_quality, DepthQuality::Good);

        // Still below the bottom threshold but too deep for the band
        let update = machine.update(&knee_sample(70.0), at(1));
        assert_eq!(update.depth_quality, DepthQuality::TooDeep);
    }

    #[test]
    fn test_curl_rep_counts_on_return_to_extension() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::BicepCurl, immediate_config());

        let sequence = [170.0, 100.0, 30.0, 100.0, 170.0];
        let mut last = None;
        for (i, &angle) in sequence.iter().enumerate() {
            last = Some(machine.update(&elbow_sample(angle), at(i as i64)));
        }

        let update = last.unwrap();
        assert_eq!(update.rep_count, 1);
        assert!((update.rep_completed.unwrap().min_angle - 30.0).abs() < 1e-6);
        // Smoothness-scored kinds leave the depth label unknown
        assert_eq!(update.depth_quality, DepthQuality::Unknown);
    }

    #[test]
    fn test_curl_smoothness_scoring() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::BicepCurl, immediate_config());

        // Jerky motion: large frame-to-frame deltas
        for (i, &angle) in [170.0, 120.0, 170.0, 120.0, 170.0].iter().enumerate() {
            machine.update(&elbow_sample(angle), at(i as i64));
        }
        assert!(machine.form_score() < 100.0);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut machine =
            ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());
        for (i, &angle) in [170.0, 120.0, 95.0, 120.0, 170.0].iter().enumerate() {
            machine.update(&knee_sample(angle), at(i as i64));
        }
        assert_eq!(machine.rep_count(), 1);

        machine.reset();
        assert_eq!(machine.rep_count(), 0);
        assert_eq!(machine.phase(), ExercisePhase::Unknown);
        assert!(machine.smoothed_angle().is_none());
        assert!(machine.rep_history().is_empty());
        assert_eq!(machine.form_score(), 100.0);
    }

    proptest! {
        #[test]
        fn prop_form_score_always_within_bounds(
            angles in proptest::collection::vec(20.0f64..180.0, 1..200)
        ) {
            let mut machine =
                ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());
            for (i, &angle) in angles.iter().enumerate() {
                let update = machine.update(&knee_sample(angle), at(i as i64));
                prop_assert!((60.0..=100.0).contains(&update.form_score));
            }
        }

        #[test]
        fn prop_rep_count_never_decreases(
            angles in proptest::collection::vec(20.0f64..180.0, 1..200)
        ) {
            let mut machine =
                ExerciseStateMachine::new(1, ExerciseKind::Squat, immediate_config());
            let mut last = 0u32;
            for (i, &angle) in angles.iter().enumerate() {
                let update = machine.update(&knee_sample(angle), at(i as i64));
                prop_assert!(update.rep_count >= last);
                last = update.rep_count;
            }
        }
    }
}
