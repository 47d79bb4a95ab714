//! Per-person spatial tracks

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use person_tracking::PersonId;
use pose_geometry::{posture_angle, Joint, Point2, PoseSample};

use crate::zone::ZoneId;

/// Pose feature summary kept per frame for posture analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFeatures {
    /// Horizontal shoulder span (pixels)
    pub shoulder_width: f64,
    /// Vertical nose-to-hip extent (pixels)
    pub body_height: f64,
    /// Signed torso angle from vertical (degrees)
    pub posture_angle: f64,
}

impl PoseFeatures {
    /// Extract features from a pose sample; `None` when the torso is not
    /// visible enough to measure
    pub fn extract(sample: &PoseSample) -> Option<Self> {
        let shoulder = sample.shoulder_midpoint()?;
        let hip = sample.hip_midpoint()?;

        let shoulder_width = match (
            sample.point(Joint::LeftShoulder),
            sample.point(Joint::RightShoulder),
        ) {
            (Some(left), Some(right)) => (left.x - right.x).abs(),
            _ => 0.0,
        };
        let body_height = sample
            .point(Joint::Nose)
            .map_or(0.0, |nose| (nose.y - hip.y).abs());

        Some(Self {
            shoulder_width,
            body_height,
            posture_angle: posture_angle(shoulder, hip),
        })
    }
}

/// A timestamped position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPosition {
    pub point: Point2,
    pub timestamp: DateTime<Utc>,
}

/// Spatial history for one tracked person.
///
/// Positions are time-ordered and ring-bounded; zone membership toggles only
/// on boundary crossings, never re-fires while inside.
#[derive(Debug, Clone)]
pub struct PersonTrack {
    pub person_id: PersonId,
    positions: VecDeque<TimedPosition>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Instantaneous speed from the last two positions (pixels/second)
    pub speed: f64,
    zones_occupied: HashSet<ZoneId>,
    pose_history: VecDeque<PoseFeatures>,
    pub alert_count: u32,
}

impl PersonTrack {
    /// Create an empty track; the first observation arrives via `observe`
    pub fn new(person_id: PersonId, now: DateTime<Utc>) -> Self {
        Self {
            person_id,
            positions: VecDeque::new(),
            first_seen: now,
            last_seen: now,
            speed: 0.0,
            zones_occupied: HashSet::new(),
            pose_history: VecDeque::new(),
            alert_count: 0,
        }
    }

    /// Record one frame's position and optional pose features
    pub fn observe(
        &mut self,
        point: Point2,
        features: Option<PoseFeatures>,
        now: DateTime<Utc>,
        max_positions: usize,
        max_pose_history: usize,
    ) {
        while self.positions.len() >= max_positions.max(1) {
            self.positions.pop_front();
        }
        self.positions.push_back(TimedPosition {
            point,
            timestamp: now,
        });

        if let Some(features) = features {
            while self.pose_history.len() >= max_pose_history.max(1) {
                self.pose_history.pop_front();
            }
            self.pose_history.push_back(features);
        }

        self.last_seen = now;
    }

    /// Most recent position
    pub fn last_position(&self) -> Option<TimedPosition> {
        self.positions.back().copied()
    }

    /// The two most recent positions, oldest first
    pub fn last_two_positions(&self) -> Option<(TimedPosition, TimedPosition)> {
        let len = self.positions.len();
        if len < 2 {
            return None;
        }
        Some((self.positions[len - 2], self.positions[len - 1]))
    }

    /// Up to the `n` most recent positions, oldest first
    pub fn recent_positions(&self, n: usize) -> Vec<TimedPosition> {
        let skip = self.positions.len().saturating_sub(n);
        self.positions.iter().skip(skip).copied().collect()
    }

    /// Number of recorded positions
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Latest pose-feature summary
    pub fn latest_features(&self) -> Option<&PoseFeatures> {
        self.pose_history.back()
    }

    /// Mark a zone as entered; `true` only on the occupancy transition
    pub fn enter_zone(&mut self, zone_id: ZoneId) -> bool {
        self.zones_occupied.insert(zone_id)
    }

    /// Clear a zone occupancy marker on exit
    pub fn leave_zone(&mut self, zone_id: ZoneId) {
        self.zones_occupied.remove(&zone_id);
    }

    /// Whether the person is currently marked inside a zone
    pub fn in_zone(&self, zone_id: ZoneId) -> bool {
        self.zones_occupied.contains(&zone_id)
    }
}
