//! Multi-person exercise coordination

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use person_tracking::PersonId;
use pose_geometry::PoseSample;

use crate::config::EngineConfig;
use crate::detect::detect_kind;
use crate::events::{dispatch_guarded, EventSink, TrackerEvent};
use crate::machine::{ExerciseStateMachine, MachineUpdate};
use crate::profile::ExerciseKind;

/// Aggregate session statistics across all tracked people
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_reps: u32,
    pub active_people: usize,
    pub avg_reps_per_person: f64,
    /// Person with the most reps; unset until someone completes one
    pub best_performer: Option<PersonId>,
    pub best_rep_count: u32,
    pub session_duration_secs: f64,
}

/// One person's state machines, created lazily per exercise kind
#[derive(Default)]
struct MachineBundle {
    machines: BTreeMap<ExerciseKind, ExerciseStateMachine>,
}

impl MachineBundle {
    fn rep_total(&self) -> u32 {
        self.machines.values().map(|m| m.rep_count()).sum()
    }

    fn last_rep_time(&self) -> Option<DateTime<Utc>> {
        self.machines.values().filter_map(|m| m.last_rep_time()).max()
    }
}

/// Routes landmark updates to per-person state machines and aggregates
/// session-wide statistics.
///
/// Bundles are created lazily on first sighting of an id (firing `NewPerson`);
/// `reset` starts a fresh session while preserving the id -> machine
/// assignment. Stale-person eviction is a separate explicit call, a
/// memory-bound rather than a correctness concern.
pub struct ExerciseCoordinator {
    config: EngineConfig,
    active_kind: ExerciseKind,
    auto_detect: bool,
    bundles: BTreeMap<PersonId, MachineBundle>,
    sinks: Vec<Box<dyn EventSink + Send>>,
    session_start: DateTime<Utc>,
}

impl ExerciseCoordinator {
    /// Create a coordinator; `started_at` anchors the session duration
    pub fn new(config: EngineConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            auto_detect: config.auto_detect,
            config,
            active_kind: ExerciseKind::Squat,
            bundles: BTreeMap::new(),
            sinks: Vec::new(),
            session_start: started_at,
        }
    }

    /// Register a lifecycle event subscriber
    pub fn add_sink(&mut self, sink: Box<dyn EventSink + Send>) {
        self.sinks.push(sink);
    }

    /// Deliver an event to every registered sink behind a panic guard
    fn emit(&mut self, event: TrackerEvent) {
        for sink in &mut self.sinks {
            dispatch_guarded(sink.as_mut(), &event);
        }
    }

    /// Currently active exercise kind
    pub fn active_kind(&self) -> ExerciseKind {
        self.active_kind
    }

    /// Manually select the exercise kind and disable auto-detection
    pub fn set_exercise(&mut self, kind: ExerciseKind) {
        self.active_kind = kind;
        self.auto_detect = false;
    }

    /// Re-enable automatic exercise detection
    pub fn enable_auto_detection(&mut self) {
        self.auto_detect = true;
    }

    /// Feed one person's pose sample for the frame
    pub fn update_person(
        &mut self,
        person_id: PersonId,
        sample: &PoseSample,
        now: DateTime<Utc>,
    ) -> MachineUpdate {
        if self.auto_detect {
            let detected = detect_kind(sample, self.active_kind);
            if detected != self.active_kind {
                info!(from = ?self.active_kind, to = ?detected, "exercise switched by auto-detection");
                self.active_kind = detected;
            }
        }

        if !self.bundles.contains_key(&person_id) {
            self.bundles.insert(person_id, MachineBundle::default());
            debug!(person_id, "new person bundle created");
            self.emit(TrackerEvent::NewPerson { person_id });
        }

        let kind = self.active_kind;
        let config = self.config.clone();
        let update = {
            let bundle = self
                .bundles
                .entry(person_id)
                .or_insert_with(MachineBundle::default);
            let machine = bundle
                .machines
                .entry(kind)
                .or_insert_with(|| ExerciseStateMachine::new(person_id, kind, config));
            machine.update(sample, now)
        };

        if let Some((from, to)) = update.phase_changed {
            self.emit(TrackerEvent::StateChanged { person_id, from, to });
        }
        if let Some(rep) = update.rep_completed {
            self.emit(TrackerEvent::RepCompleted {
                person_id,
                rep_count: update.rep_count,
                min_angle: rep.min_angle,
            });
        }

        update
    }

    /// Aggregate statistics across every owned state machine
    pub fn aggregate_stats(&self, now: DateTime<Utc>) -> SessionStats {
        let mut total_reps = 0u32;
        let mut best: Option<(PersonId, u32)> = None;

        for (&person_id, bundle) in &self.bundles {
            let reps = bundle.rep_total();
            total_reps += reps;
            if reps > best.map_or(0, |(_, count)| count) {
                best = Some((person_id, reps));
            }
        }

        let active_people = self.bundles.len();
        let avg_reps_per_person = if active_people > 0 {
            f64::from(total_reps) / active_people as f64
        } else {
            0.0
        };

        SessionStats {
            total_reps,
            active_people,
            avg_reps_per_person,
            best_performer: best.map(|(id, _)| id),
            best_rep_count: best.map_or(0, |(_, count)| count),
            session_duration_secs: (now - self.session_start).num_milliseconds() as f64
                / 1000.0,
        }
    }

    /// Start a fresh session: zero every machine's counters but keep the
    /// same id -> machine assignment
    pub fn reset(&mut self, now: DateTime<Utc>) {
        for bundle in self.bundles.values_mut() {
            for machine in bundle.machines.values_mut() {
                machine.reset();
            }
        }
        self.session_start = now;
        info!("exercise session reset");
    }

    /// Remove people with no completed rep for longer than the configured
    /// inactivity timeout. Returns how many were removed.
    pub fn evict_inactive(&mut self, now: DateTime<Utc>) -> usize {
        let timeout = self.config.inactive_timeout_secs;
        let before = self.bundles.len();
        self.bundles.retain(|&person_id, bundle| {
            let stale = bundle.last_rep_time().map_or(false, |last| {
                (now - last).num_milliseconds() as f64 / 1000.0 > timeout
            });
            if stale {
                debug!(person_id, "evicting inactive person");
            }
            !stale
        });
        before - self.bundles.len()
    }

    /// Ids of every known person
    pub fn person_ids(&self) -> Vec<PersonId> {
        self.bundles.keys().copied().collect()
    }
}
