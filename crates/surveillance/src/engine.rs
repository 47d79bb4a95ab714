//! Surveillance analysis engine

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use alerting::{Alert, AlertSink, AlertType};
use person_tracking::PersonId;
use pose_geometry::{Point2, PoseSample};

use crate::config::SurveillanceConfig;
use crate::movement::MovementAnalyzer;
use crate::track::{PersonTrack, PoseFeatures};
use crate::zone::{parse_zones, RestrictedZone, ZoneId};

/// Per-frame processing report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Ids observed this frame, matched or newly created
    pub observed: Vec<PersonId>,
    /// Alerts raised through the funnel this frame
    pub alerts_raised: usize,
    /// Alerts the sink actually delivered (cooldown applies)
    pub alerts_delivered: usize,
}

/// Session summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveillanceSummary {
    pub active_people: usize,
    pub total_people_detected: u64,
    pub active_alerts: usize,
    pub total_alerts: usize,
    pub zones: usize,
}

/// Tracks people spatially and raises zone, movement, and fall alerts.
///
/// Identity matching here is deliberately separate from the fitness-side
/// centroid tracker: it matches raw hip positions against track tails with
/// its own lifecycle, while the centroid tracker matches detection boxes
/// with frame-count eviction.
pub struct SurveillanceEngine {
    config: SurveillanceConfig,
    movement: MovementAnalyzer,
    tracks: BTreeMap<PersonId, PersonTrack>,
    next_person_id: PersonId,
    zones: BTreeMap<ZoneId, RestrictedZone>,
    alerts: VecDeque<Alert>,
    alerts_by_type: HashMap<AlertType, u64>,
    total_people_detected: u64,
    sink: Box<dyn AlertSink + Send>,
    session_id: String,
}

impl SurveillanceEngine {
    /// Create an engine forwarding alerts to the given sink
    pub fn new(
        config: SurveillanceConfig,
        sink: Box<dyn AlertSink + Send>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            movement: MovementAnalyzer::new(config.clone()),
            config,
            tracks: BTreeMap::new(),
            next_person_id: 1,
            zones: BTreeMap::new(),
            alerts: VecDeque::new(),
            alerts_by_type: HashMap::new(),
            total_people_detected: 0,
            sink,
            session_id: session_id.into(),
        }
    }

    /// Add or replace a restricted zone
    pub fn add_zone(&mut self, zone: RestrictedZone) {
        self.zones.insert(zone.zone_id, zone);
    }

    /// Remove a zone, returning whether it existed
    pub fn remove_zone(&mut self, zone_id: ZoneId) -> bool {
        self.zones.remove(&zone_id).is_some()
    }

    /// Load zones from their JSON config form, falling back to a built-in
    /// default zone when the config cannot be parsed
    pub fn load_zones_or_default(&mut self, json: &str) {
        match parse_zones(json) {
            Ok(zones) => {
                let count = zones.len();
                for zone in zones {
                    self.add_zone(zone);
                }
                info!(count, "loaded surveillance zones from config");
            }
            Err(err) => {
                warn!(%err, "could not load zone config; using default zone");
                self.add_zone(Self::default_zone());
            }
        }
    }

    fn default_zone() -> RestrictedZone {
        RestrictedZone::new(
            1,
            "Restricted Area 1",
            vec![
                Point2::new(50.0, 50.0),
                Point2::new(200.0, 50.0),
                Point2::new(200.0, 150.0),
                Point2::new(50.0, 150.0),
            ],
        )
    }

    /// Process one frame's pose observations.
    ///
    /// Each observed pose is reduced to a hip-midpoint position, matched to
    /// the nearest unclaimed track within the matching distance (or given a
    /// fresh track), then analyzed for speed, loitering, zone transitions,
    /// and falls. A frame with no usable poses updates nothing.
    pub fn process_frame(&mut self, samples: &[PoseSample], now: DateTime<Utc>) -> FrameReport {
        let mut report = FrameReport {
            observed: Vec::new(),
            alerts_raised: 0,
            alerts_delivered: 0,
        };
        let mut claimed: HashSet<PersonId> = HashSet::new();

        for sample in samples {
            let Some(position) = sample.hip_midpoint() else {
                continue;
            };
            let features = PoseFeatures::extract(sample);

            let person_id = self.match_or_create(position, &claimed, now);
            claimed.insert(person_id);

            if let Some(track) = self.tracks.get_mut(&person_id) {
                track.observe(
                    position,
                    features,
                    now,
                    self.config.max_positions,
                    self.config.max_pose_history,
                );
            }
            report.observed.push(person_id);

            let (raised, delivered) = self.analyze_person(person_id, now);
            report.alerts_raised += raised;
            report.alerts_delivered += delivered;
        }

        report
    }

    /// Greedy nearest-track matching over raw positions; unmatched
    /// observations start a new track
    fn match_or_create(
        &mut self,
        position: Point2,
        claimed: &HashSet<PersonId>,
        now: DateTime<Utc>,
    ) -> PersonId {
        let mut best: Option<(PersonId, f64)> = None;
        for (&id, track) in &self.tracks {
            if claimed.contains(&id) {
                continue;
            }
            let Some(last) = track.last_position() else {
                continue;
            };
            let distance = position.distance_to(last.point);
            if distance < self.config.match_distance
                && best.map_or(true, |(_, d)| distance < d)
            {
                best = Some((id, distance));
            }
        }

        match best {
            Some((id, _)) => id,
            None => {
                let id = self.next_person_id;
                self.next_person_id += 1;
                self.total_people_detected += 1;
                self.tracks.insert(id, PersonTrack::new(id, now));
                debug!(person_id = id, "new surveillance track");
                id
            }
        }
    }

    fn analyze_person(&mut self, person_id: PersonId, now: DateTime<Utc>) -> (usize, usize) {
        let mut pending: Vec<Alert> = Vec::new();

        {
            let Some(track) = self.tracks.get_mut(&person_id) else {
                return (0, 0);
            };

            if let Some(alert) = self.movement.analyze_speed(track) {
                pending.push(alert);
            }
            if let Some(alert) = self.movement.analyze_loitering(track) {
                pending.push(alert);
            }

            if let Some(current) = track.last_position() {
                for zone in self.zones.values() {
                    if zone.contains(current.point) {
                        // Alert only on the outside -> inside transition
                        if track.enter_zone(zone.zone_id) {
                            pending.push(Alert::new(
                                zone.alert_type,
                                now,
                                person_id,
                                current.point,
                                0.9,
                                format!("Person entered {}", zone.name),
                            ));
                        }
                    } else {
                        // Exit clears the marker without an alert
                        track.leave_zone(zone.zone_id);
                    }
                }
            }

            if let Some(alert) = self.movement.analyze_fall(track, now) {
                pending.push(alert);
            }
        }

        let raised = pending.len();
        let mut delivered = 0;
        for alert in pending {
            if self.add_alert(alert) {
                delivered += 1;
            }
        }
        (raised, delivered)
    }

    /// Single funnel for every raised alert: bounded history, per-type and
    /// per-person counters, then the sink's cooldown verdict
    pub fn add_alert(&mut self, alert: Alert) -> bool {
        while self.alerts.len() >= self.config.max_alerts_in_memory.max(1) {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert.clone());

        *self.alerts_by_type.entry(alert.alert_type).or_insert(0) += 1;
        if let Some(track) = self.tracks.get_mut(&alert.person_id) {
            track.alert_count += 1;
        }

        self.sink.submit(&alert, &self.session_id)
    }

    /// Flip an alert's resolved flag; `true` only on the first resolution
    pub fn resolve_alert(&mut self, index: usize) -> bool {
        match self.alerts.get_mut(index) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                true
            }
            _ => false,
        }
    }

    /// In-memory alert history, oldest first
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Alerts raised for a type since session start (suppressed included)
    pub fn raised_count(&self, alert_type: AlertType) -> u64 {
        self.alerts_by_type.get(&alert_type).copied().unwrap_or(0)
    }

    /// Track lookup for inspection
    pub fn track(&self, person_id: PersonId) -> Option<&PersonTrack> {
        self.tracks.get(&person_id)
    }

    /// Session summary at a point in time
    pub fn summary(&self, now: DateTime<Utc>) -> SurveillanceSummary {
        let active_people = self
            .tracks
            .values()
            .filter(|track| {
                (now - track.last_seen).num_milliseconds() as f64 / 1000.0
                    < self.config.active_window_secs
            })
            .count();

        SurveillanceSummary {
            active_people,
            total_people_detected: self.total_people_detected,
            active_alerts: self.alerts.iter().filter(|a| !a.resolved).count(),
            total_alerts: self.alerts.len(),
            zones: self.zones.len(),
        }
    }

    /// Drop tracks unseen for longer than `max_age_secs`, returning how many
    pub fn prune_stale(&mut self, now: DateTime<Utc>, max_age_secs: f64) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|&id, track| {
            let fresh = (now - track.last_seen).num_milliseconds() as f64 / 1000.0 <= max_age_secs;
            if !fresh {
                debug!(person_id = id, "pruning stale surveillance track");
            }
            fresh
        });
        before - self.tracks.len()
    }

    /// Clear all session data and restart id assignment
    pub fn reset_session(&mut self) {
        self.tracks.clear();
        self.alerts.clear();
        self.alerts_by_type.clear();
        self.total_people_detected = 0;
        self.next_person_id = 1;
        info!("surveillance session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertDispatcher, NullSink};
    use chrono::TimeZone;
    use pose_geometry::Joint;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    /// Pose with hips centered on (x, y); no torso, so no fall analysis
    fn hips_at(x: f64, y: f64) -> PoseSample {
        PoseSample::new()
            .with_landmark(Joint::LeftHip, Point2::new(x - 10.0, y), 0.9)
            .with_landmark(Joint::RightHip, Point2::new(x + 10.0, y), 0.9)
    }

    /// Pose lying flat: torso horizontal, hips centered on (x, y)
    fn fallen_at(x: f64, y: f64) -> PoseSample {
        hips_at(x, y)
            .with_landmark(Joint::LeftShoulder, Point2::new(x - 100.0, y - 5.0), 0.9)
            .with_landmark(Joint::RightShoulder, Point2::new(x - 100.0, y + 5.0), 0.9)
    }

    fn engine() -> SurveillanceEngine {
        SurveillanceEngine::new(
            SurveillanceConfig::default(),
            Box::new(NullSink),
            "test-session",
        )
    }

    #[test]
    fn test_zone_entry_fires_exactly_once_while_inside() {
        let mut engine = engine();
        engine.add_zone(SurveillanceEngine::default_zone());

        // Approach from outside, cross in, then linger inside
        let path = [(300.0, 100.0), (220.0, 100.0), (150.0, 100.0), (150.0, 100.0), (120.0, 100.0)];
        for (i, &(x, y)) in path.iter().enumerate() {
            engine.process_frame(&[hips_at(x, y)], at(i as i64));
        }

        let entries = engine
            .alerts()
            .filter(|a| a.alert_type == AlertType::RestrictedZoneEntry)
            .count();
        assert_eq!(entries, 1);
        assert!(engine.track(1).unwrap().in_zone(1));
    }

    #[test]
    fn test_zone_reentry_fires_again() {
        let mut engine = engine();
        engine.add_zone(SurveillanceEngine::default_zone());

        let path = [
            (300.0, 100.0),
            (220.0, 100.0),
            (150.0, 100.0), // enter
            (220.0, 100.0), // exit (no alert)
            (300.0, 100.0),
            (220.0, 100.0),
            (150.0, 100.0), // enter again
        ];
        for (i, &(x, y)) in path.iter().enumerate() {
            engine.process_frame(&[hips_at(x, y)], at(i as i64 * 10));
        }

        let entries = engine
            .alerts()
            .filter(|a| a.alert_type == AlertType::RestrictedZoneEntry)
            .count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_rapid_movement_alert() {
        let mut engine = engine();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let t1 = Utc.timestamp_millis_opt(1_700_000_000_200).unwrap();

        engine.process_frame(&[hips_at(0.0, 0.0)], t0);
        // 90 px in 200 ms -> 450 px/s, same track (under the match distance)
        let report = engine.process_frame(&[hips_at(90.0, 0.0)], t1);

        assert_eq!(report.alerts_raised, 1);
        assert_eq!(engine.raised_count(AlertType::RapidMovement), 1);
        assert!((engine.track(1).unwrap().speed - 450.0).abs() < 1e-6);
    }

    #[test]
    fn test_fall_alert_for_horizontal_posture() {
        let mut engine = engine();
        let report = engine.process_frame(&[fallen_at(100.0, 200.0)], at(0));

        assert_eq!(report.alerts_raised, 1);
        let alert = engine.alerts().next().unwrap();
        assert_eq!(alert.alert_type, AlertType::FallDetected);
        assert!(alert.confidence > 0.9);
    }

    #[test]
    fn test_loitering_alert_after_standing_still() {
        let mut engine = engine();
        // Ten observations in place across 36 seconds
        for i in 0..10 {
            engine.process_frame(&[hips_at(400.0, 300.0)], at(i * 4));
        }
        assert!(engine.raised_count(AlertType::Loitering) >= 1);
    }

    #[test]
    fn test_distinct_people_get_distinct_tracks() {
        let mut engine = engine();
        let report =
            engine.process_frame(&[hips_at(100.0, 100.0), hips_at(600.0, 400.0)], at(0));

        assert_eq!(report.observed, vec![1, 2]);
        assert_eq!(engine.summary(at(0)).total_people_detected, 2);
    }

    #[test]
    fn test_same_person_keeps_track_across_frames() {
        let mut engine = engine();
        engine.process_frame(&[hips_at(100.0, 100.0)], at(0));
        let report = engine.process_frame(&[hips_at(130.0, 100.0)], at(1));
        assert_eq!(report.observed, vec![1]);
        assert_eq!(engine.summary(at(1)).total_people_detected, 1);
    }

    #[test]
    fn test_cooldown_limits_delivery_but_history_keeps_all() {
        let mut engine = SurveillanceEngine::new(
            SurveillanceConfig::default(),
            Box::new(AlertDispatcher::default()),
            "test-session",
        );
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let mut delivered = 0;
        // Rapid back-and-forth darting, five frames 200 ms apart
        for i in 0..5 {
            let x = if i % 2 == 0 { 0.0 } else { 90.0 };
            let t = t0 + chrono::Duration::milliseconds(i * 200);
            let report = engine.process_frame(&[hips_at(x, 0.0)], t);
            delivered += report.alerts_delivered;
        }

        // Four speed alerts raised, only the first clears the 5 s cooldown
        assert_eq!(engine.raised_count(AlertType::RapidMovement), 4);
        assert_eq!(delivered, 1);
    }

    #[test]
    fn test_alert_history_is_bounded() {
        let config = SurveillanceConfig {
            max_alerts_in_memory: 2,
            ..Default::default()
        };
        let mut engine =
            SurveillanceEngine::new(config, Box::new(NullSink), "test-session");

        for i in 0..4 {
            engine.add_alert(Alert::new(
                AlertType::PersonDetected,
                at(i),
                1,
                Point2::new(0.0, 0.0),
                0.8,
                format!("alert {i}"),
            ));
        }

        assert_eq!(engine.alerts().count(), 2);
        // Oldest entries dropped first
        assert_eq!(engine.alerts().next().unwrap().description, "alert 2");
        // The per-type counter still saw every raise
        assert_eq!(engine.raised_count(AlertType::PersonDetected), 4);
    }

    #[test]
    fn test_resolve_alert_flips_once() {
        let mut engine = engine();
        engine.add_alert(Alert::new(
            AlertType::Loitering,
            at(0),
            1,
            Point2::new(0.0, 0.0),
            0.7,
            "loitering",
        ));

        assert!(engine.resolve_alert(0));
        assert!(!engine.resolve_alert(0));
        assert!(!engine.resolve_alert(99));
        assert_eq!(engine.summary(at(0)).active_alerts, 0);
    }

    #[test]
    fn test_reset_session_restarts_ids() {
        let mut engine = engine();
        engine.process_frame(&[hips_at(100.0, 100.0)], at(0));
        assert_eq!(engine.summary(at(0)).total_people_detected, 1);

        engine.reset_session();
        let summary = engine.summary(at(1));
        assert_eq!(summary.total_people_detected, 0);
        assert_eq!(summary.total_alerts, 0);

        let report = engine.process_frame(&[hips_at(100.0, 100.0)], at(2));
        assert_eq!(report.observed, vec![1]);
    }

    #[test]
    fn test_load_zones_falls_back_on_bad_config() {
        let mut engine = engine();
        engine.load_zones_or_default("{ broken");
        assert_eq!(engine.summary(at(0)).zones, 1);
        // The fallback zone is the documented default rectangle
        engine.process_frame(&[hips_at(100.0, 100.0)], at(0));
        assert_eq!(engine.raised_count(AlertType::RestrictedZoneEntry), 1);
    }

    #[test]
    fn test_prune_stale_tracks() {
        let mut engine = engine();
        engine.process_frame(&[hips_at(100.0, 100.0)], at(0));
        engine.process_frame(&[hips_at(600.0, 400.0)], at(50));

        let pruned = engine.prune_stale(at(60), 30.0);
        assert_eq!(pruned, 1);
        assert!(engine.track(1).is_none());
        assert!(engine.track(2).is_some());
    }
}
