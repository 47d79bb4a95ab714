//! Centroid-based identity tracker

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pose_geometry::Point2;

use crate::detection::PersonDetection;
use crate::PersonId;

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum centroid distance for a match (pixels)
    pub max_distance: f64,
    /// Consecutive missed frames before a track is evicted
    pub max_frames_missing: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            max_frames_missing: 30,
        }
    }
}

/// A person currently being tracked
#[derive(Debug, Clone)]
pub struct TrackedPerson {
    pub id: PersonId,
    /// Last matched centroid
    pub centroid: Point2,
    /// Frame index of the last match
    pub last_seen: u64,
}

/// Assigns stable ids to detections across frames.
///
/// Matching is greedy in ascending id order: long-lived tracks claim their
/// nearest unclaimed detection first, a deliberate tie-break favoring
/// stability of old ids.
pub struct CentroidTracker {
    config: TrackerConfig,
    tracks: BTreeMap<PersonId, TrackedPerson>,
    next_id: PersonId,
    frame_count: u64,
}

impl CentroidTracker {
    /// Create a tracker with the given configuration
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 0,
            frame_count: 0,
        }
    }

    /// Assign ids to this frame's detections, returning id -> detection index.
    ///
    /// Each existing track claims at most one detection and each detection is
    /// claimed at most once. Unclaimed detections spawn fresh tracks; tracks
    /// unseen for longer than the eviction window are dropped afterwards.
    pub fn update_indexed(
        &mut self,
        detections: &[PersonDetection],
    ) -> BTreeMap<PersonId, usize> {
        self.frame_count += 1;

        let mut assignments = BTreeMap::new();
        let mut claimed = vec![false; detections.len()];

        for (&id, track) in self.tracks.iter_mut() {
            let mut best: Option<(usize, f64)> = None;
            for (idx, detection) in detections.iter().enumerate() {
                if claimed[idx] {
                    continue;
                }
                let distance = track.centroid.distance_to(detection.centroid());
                if distance <= self.config.max_distance
                    && best.map_or(true, |(_, d)| distance < d)
                {
                    best = Some((idx, distance));
                }
            }

            if let Some((idx, _)) = best {
                claimed[idx] = true;
                track.centroid = detections[idx].centroid();
                track.last_seen = self.frame_count;
                assignments.insert(id, idx);
            }
        }

        for (idx, detection) in detections.iter().enumerate() {
            if claimed[idx] {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            self.tracks.insert(
                id,
                TrackedPerson {
                    id,
                    centroid: detection.centroid(),
                    last_seen: self.frame_count,
                },
            );
            assignments.insert(id, idx);
            debug!(person_id = id, "new track created");
        }

        self.evict_stale();
        assignments
    }

    /// Assign ids to this frame's detections, returning id -> detection
    pub fn update(
        &mut self,
        detections: &[PersonDetection],
    ) -> BTreeMap<PersonId, PersonDetection> {
        self.update_indexed(detections)
            .into_iter()
            .map(|(id, idx)| (id, detections[idx].clone()))
            .collect()
    }

    fn evict_stale(&mut self) {
        let frame = self.frame_count;
        let max_missing = self.config.max_frames_missing;
        self.tracks.retain(|&id, track| {
            let keep = frame - track.last_seen <= max_missing;
            if !keep {
                debug!(person_id = id, "track evicted after missing frames");
            }
            keep
        });
    }

    /// Number of currently tracked persons
    pub fn active_count(&self) -> usize {
        self.tracks.len()
    }

    /// Clear all tracks and restart id assignment
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 0;
        self.frame_count = 0;
    }
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn detection_at(x: f64, y: f64) -> PersonDetection {
        PersonDetection::new(BoundingBox::new(x - 5.0, y - 5.0, 10.0, 10.0), 0.9)
    }

    #[test]
    fn test_first_frame_assigns_sequential_ids() {
        let mut tracker = CentroidTracker::default();
        let ids = tracker.update(&[detection_at(0.0, 0.0), detection_at(500.0, 500.0)]);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains_key(&0));
        assert!(ids.contains_key(&1));
    }

    #[test]
    fn test_matches_closest_track() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[detection_at(0.0, 0.0), detection_at(500.0, 500.0)]);

        // A detection near (0, 0) must claim the track that was at (0, 0),
        // never the one at (500, 500)
        let ids = tracker.update(&[detection_at(10.0, 10.0)]);
        assert_eq!(ids.len(), 1);
        assert!(ids.contains_key(&0));
    }

    #[test]
    fn test_distant_detection_spawns_new_track() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[detection_at(0.0, 0.0)]);

        // Beyond max_distance: not a match
        let ids = tracker.update(&[detection_at(400.0, 400.0)]);
        assert!(!ids.contains_key(&0));
        assert!(ids.contains_key(&1));
    }

    #[test]
    fn test_eviction_and_fresh_id_on_reappearance() {
        let config = TrackerConfig {
            max_frames_missing: 2,
            ..Default::default()
        };
        let mut tracker = CentroidTracker::new(config);
        tracker.update(&[detection_at(0.0, 0.0)]);
        assert_eq!(tracker.active_count(), 1);

        // Missing for more than max_frames_missing frames
        for _ in 0..3 {
            tracker.update(&[]);
        }
        assert_eq!(tracker.active_count(), 0);

        // Reappearance gets a new id, never the old one
        let ids = tracker.update(&[detection_at(0.0, 0.0)]);
        assert!(!ids.contains_key(&0));
        assert!(ids.contains_key(&1));
    }

    #[test]
    fn test_one_to_one_assignment() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[detection_at(0.0, 0.0), detection_at(50.0, 0.0)]);

        // One detection between two tracks: only the nearest track claims it
        let ids = tracker.update(&[detection_at(45.0, 0.0)]);
        assert_eq!(ids.len(), 1);
        assert!(ids.contains_key(&1));
    }

    #[test]
    fn test_id_stable_across_small_motion() {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[detection_at(100.0, 100.0)]);
        for step in 1..20 {
            let ids = tracker.update(&[detection_at(100.0 + step as f64 * 5.0, 100.0)]);
            assert!(ids.contains_key(&0));
        }
    }
}
