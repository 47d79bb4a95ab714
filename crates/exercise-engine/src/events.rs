//! Lifecycle events and subscriber sinks

use tracing::warn;

use person_tracking::PersonId;

use crate::machine::ExercisePhase;

/// Events emitted by the coordinator, delivered synchronously inline with
/// the update call that produced them
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// First sighting of a person id
    NewPerson { person_id: PersonId },
    /// A rep just completed
    RepCompleted {
        person_id: PersonId,
        rep_count: u32,
        min_angle: f64,
    },
    /// A committed phase transition
    StateChanged {
        person_id: PersonId,
        from: ExercisePhase,
        to: ExercisePhase,
    },
}

/// Observer for tracker lifecycle events
pub trait EventSink {
    fn on_event(&mut self, event: &TrackerEvent);
}

/// Invoke a sink behind a panic guard. A failing subscriber must not corrupt
/// tracker state or abort the frame's processing.
pub(crate) fn dispatch_guarded(sink: &mut dyn EventSink, event: &TrackerEvent) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        sink.on_event(event)
    }));
    if outcome.is_err() {
        warn!(?event, "event sink panicked; continuing");
    }
}
