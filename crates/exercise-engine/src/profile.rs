//! Exercise profiles
//!
//! All exercise kinds share one state-machine topology; a profile only swaps
//! the measured joint triplet, the phase thresholds, and the quality rule.
//! "Standing" is the extended rest posture for every kind, so the bottom
//! threshold always sits at the contracted (smaller-angle) extreme,
//! including bicep curls where the contracted extreme is colloquially "up".

use serde::{Deserialize, Serialize};

use pose_geometry::{
    fuse_sides, joint_angle, segment_angle_from_horizontal, Joint, PoseSample,
};

/// Supported exercise kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    Pushup,
    BicepCurl,
}

impl ExerciseKind {
    /// Every supported kind, in auto-detection scan order
    pub const ALL: [ExerciseKind; 3] = [
        ExerciseKind::Squat,
        ExerciseKind::Pushup,
        ExerciseKind::BicepCurl,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Pushup => "push-up",
            ExerciseKind::BicepCurl => "bicep curl",
        }
    }
}

/// How form quality is scored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityRule {
    /// Reward the smoothed angle staying inside [good_min, good_max] while
    /// at the bottom of the rep
    Depth { good_min: f64, good_max: f64 },
    /// Reward small frame-to-frame angle deltas, penalize jerky motion
    Smoothness { steady_delta: f64, jerky_delta: f64 },
}

/// Parametric description of one exercise kind
#[derive(Debug, Clone)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    /// Above this smoothed angle the phase is Standing
    pub standing_threshold: f64,
    /// Below this smoothed angle the phase is Bottom
    pub bottom_threshold: f64,
    pub quality: QualityRule,
    /// Self-reported detection confidence when this kind is plausible
    pub base_confidence: f64,
    left_triplet: [Joint; 3],
    right_triplet: [Joint; 3],
}

impl ExerciseProfile {
    /// Knee-angle squat profile
    pub fn squat() -> Self {
        Self {
            kind: ExerciseKind::Squat,
            standing_threshold: 160.0,
            bottom_threshold: 100.0,
            quality: QualityRule::Depth {
                good_min: 90.0,
                good_max: 110.0,
            },
            base_confidence: 0.9,
            left_triplet: [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle],
            right_triplet: [Joint::RightHip, Joint::RightKnee, Joint::RightAnkle],
        }
    }

    /// Elbow-angle push-up profile
    pub fn pushup() -> Self {
        Self {
            kind: ExerciseKind::Pushup,
            standing_threshold: 160.0,
            bottom_threshold: 90.0,
            quality: QualityRule::Depth {
                good_min: 80.0,
                good_max: 100.0,
            },
            base_confidence: 0.8,
            left_triplet: [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
            right_triplet: [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
        }
    }

    /// Elbow-angle bicep-curl profile; scored on motion smoothness rather
    /// than depth
    pub fn bicep_curl() -> Self {
        Self {
            kind: ExerciseKind::BicepCurl,
            standing_threshold: 160.0,
            bottom_threshold: 40.0,
            quality: QualityRule::Smoothness {
                steady_delta: 5.0,
                jerky_delta: 15.0,
            },
            base_confidence: 0.7,
            left_triplet: [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
            right_triplet: [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
        }
    }

    /// Default profile for a kind
    pub fn for_kind(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Squat => Self::squat(),
            ExerciseKind::Pushup => Self::pushup(),
            ExerciseKind::BicepCurl => Self::bicep_curl(),
        }
    }

    /// Fused joint angle for this exercise, `None` when neither side is
    /// measurable this frame
    pub fn measure(&self, sample: &PoseSample) -> Option<f64> {
        let left = Self::triplet_angle(sample, &self.left_triplet);
        let right = Self::triplet_angle(sample, &self.right_triplet);
        fuse_sides(left, right)
    }

    fn triplet_angle(sample: &PoseSample, joints: &[Joint; 3]) -> Option<f64> {
        let a = sample.point(joints[0])?;
        let b = sample.point(joints[1])?;
        let c = sample.point(joints[2])?;
        joint_angle(a, b, c)
    }

    /// Whether the body geometry is consistent with this exercise being
    /// performed
    pub fn is_plausible(&self, sample: &PoseSample) -> bool {
        match self.kind {
            ExerciseKind::Squat => self
                .measure(sample)
                .map_or(false, |angle| (90.0..=170.0).contains(&angle)),
            // Push-ups happen with the torso near horizontal
            ExerciseKind::Pushup => torso_angle(sample).map_or(false, |angle| angle < 30.0),
            // Curls happen standing, torso near vertical
            ExerciseKind::BicepCurl => torso_angle(sample).map_or(false, |angle| angle > 70.0),
        }
    }
}

/// Torso angle from horizontal via the shoulder and hip midpoints
fn torso_angle(sample: &PoseSample) -> Option<f64> {
    let shoulder = sample.shoulder_midpoint()?;
    let hip = sample.hip_midpoint()?;
    Some(segment_angle_from_horizontal(shoulder, hip))
}
