//! Movement pattern analysis

use chrono::{DateTime, Utc};

use alerting::{Alert, AlertType};
use pose_geometry::Point2;

use crate::config::SurveillanceConfig;
use crate::track::PersonTrack;

/// Positions considered for the loitering window
const LOITER_WINDOW: usize = 10;

/// Analyzes per-track movement for speed, loitering, and fall anomalies
#[derive(Debug, Clone, Default)]
pub struct MovementAnalyzer {
    config: SurveillanceConfig,
}

impl MovementAnalyzer {
    /// Create an analyzer with the given thresholds
    pub fn new(config: SurveillanceConfig) -> Self {
        Self { config }
    }

    /// Update the track's instantaneous speed and raise a rapid-movement
    /// alert when it exceeds the threshold
    pub fn analyze_speed(&self, track: &mut PersonTrack) -> Option<Alert> {
        let (prev, current) = track.last_two_positions()?;
        let elapsed = (current.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
        if elapsed <= 0.0 {
            return None;
        }

        let speed = prev.point.distance_to(current.point) / elapsed;
        track.speed = speed;

        if speed > self.config.speed_threshold {
            return Some(Alert::new(
                AlertType::RapidMovement,
                current.timestamp,
                track.person_id,
                current.point,
                0.8,
                format!("Rapid movement detected: {speed:.1} px/s"),
            ));
        }
        None
    }

    /// Raise a loitering alert when the recent positions stay within a small
    /// variance for longer than the loitering time
    pub fn analyze_loitering(&self, track: &PersonTrack) -> Option<Alert> {
        let recent = track.recent_positions(LOITER_WINDOW);
        if recent.len() < LOITER_WINDOW {
            return None;
        }

        let n = recent.len() as f64;
        let center_x = recent.iter().map(|p| p.point.x).sum::<f64>() / n;
        let center_y = recent.iter().map(|p| p.point.y).sum::<f64>() / n;
        let variance = recent
            .iter()
            .map(|p| (p.point.x - center_x).powi(2) + (p.point.y - center_y).powi(2))
            .sum::<f64>()
            / n;

        let first = recent.first()?;
        let last = recent.last()?;
        let span = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;

        if variance < self.config.loitering_variance && span > self.config.loitering_time_secs {
            return Some(Alert::new(
                AlertType::Loitering,
                last.timestamp,
                track.person_id,
                Point2::new(center_x, center_y),
                0.7,
                format!("Loitering detected for {span:.1} seconds"),
            ));
        }
        None
    }

    /// Raise a fall alert when the latest posture angle exceeds the
    /// threshold; confidence scales linearly from the threshold to 90 degrees
    pub fn analyze_fall(&self, track: &PersonTrack, now: DateTime<Utc>) -> Option<Alert> {
        let features = track.latest_features()?;
        let angle = features.posture_angle.abs();
        let threshold = self.config.fall_angle_threshold;
        if angle <= threshold {
            return None;
        }

        let range = (90.0 - threshold).max(f64::EPSILON);
        let confidence = ((angle - threshold) / range).clamp(0.0, 1.0);
        let location = track.last_position()?.point;

        Some(Alert::new(
            AlertType::FallDetected,
            now,
            track.person_id,
            location,
            confidence,
            format!("Possible fall detected (angle: {angle:.1} deg)"),
        ))
    }
}
