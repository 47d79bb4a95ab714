//! Exercise auto-detection

use pose_geometry::PoseSample;

use crate::profile::{ExerciseKind, ExerciseProfile};

/// Pick the exercise kind most consistent with the observed body geometry.
///
/// Each candidate kind runs a lightweight plausibility check; among plausible
/// kinds the highest self-reported confidence wins. When nothing matches, the
/// currently active kind is kept rather than thrashing to an unknown state.
pub fn detect_kind(sample: &PoseSample, current: ExerciseKind) -> ExerciseKind {
    let mut best: Option<(ExerciseKind, f64)> = None;

    for kind in ExerciseKind::ALL {
        let profile = ExerciseProfile::for_kind(kind);
        if !profile.is_plausible(sample) {
            continue;
        }
        if best.map_or(true, |(_, confidence)| profile.base_confidence > confidence) {
            best = Some((kind, profile.base_confidence));
        }
    }

    best.map_or(current, |(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_geometry::{Joint, Point2};

    /// Upright figure mid-squat: bent knees, vertical torso
    fn squatting_sample() -> PoseSample {
        PoseSample::new()
            .with_landmark(Joint::LeftShoulder, Point2::new(100.0, 50.0), 0.9)
            .with_landmark(Joint::LeftHip, Point2::new(105.0, 150.0), 0.9)
            .with_landmark(Joint::LeftKnee, Point2::new(140.0, 200.0), 0.9)
            .with_landmark(Joint::LeftAnkle, Point2::new(140.0, 280.0), 0.9)
    }

    /// Horizontal figure with straight legs
    fn plank_sample() -> PoseSample {
        PoseSample::new()
            .with_landmark(Joint::LeftShoulder, Point2::new(100.0, 300.0), 0.9)
            .with_landmark(Joint::LeftHip, Point2::new(250.0, 310.0), 0.9)
            .with_landmark(Joint::LeftKnee, Point2::new(330.0, 315.0), 0.9)
            .with_landmark(Joint::LeftAnkle, Point2::new(410.0, 320.0), 0.9)
    }

    #[test]
    fn test_squat_wins_when_knees_bent_and_upright() {
        assert_eq!(
            detect_kind(&squatting_sample(), ExerciseKind::Pushup),
            ExerciseKind::Squat
        );
    }

    #[test]
    fn test_horizontal_body_detects_pushup() {
        assert_eq!(
            detect_kind(&plank_sample(), ExerciseKind::Squat),
            ExerciseKind::Pushup
        );
    }

    #[test]
    fn test_keeps_current_kind_when_nothing_plausible() {
        let empty = PoseSample::new();
        assert_eq!(
            detect_kind(&empty, ExerciseKind::BicepCurl),
            ExerciseKind::BicepCurl
        );
    }
}
