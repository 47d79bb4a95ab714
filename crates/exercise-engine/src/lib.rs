//! Exercise Engine
//!
//! Converts per-frame joint angles into discrete exercise judgments:
//! - Parametric phase state machine shared by squat, push-up, and bicep curl
//! - Sliding-window angle smoothing tolerant of missing readings
//! - Debounced phase transitions and exact rep-completion detection
//! - Asymmetric form scoring (depth band or motion smoothness)
//! - Exercise auto-detection from body geometry
//! - Multi-person coordination with aggregate session statistics
//! - Typed lifecycle events delivered through injected sinks

pub mod config;
pub mod coordinator;
pub mod detect;
pub mod events;
pub mod machine;
pub mod profile;

pub use config::EngineConfig;
pub use coordinator::{ExerciseCoordinator, SessionStats};
pub use detect::detect_kind;
pub use events::{EventSink, TrackerEvent};
pub use machine::{
    DepthQuality, ExercisePhase, ExerciseStateMachine, MachineUpdate, RepRecord,
};
pub use profile::{ExerciseKind, ExerciseProfile, QualityRule};
