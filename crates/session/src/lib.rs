//! Session Runtime
//!
//! Wires the analysis engines into a frame-at-a-time processing loop:
//! - `FrameInput` / `PoseSource`: the contract with the external capture
//!   and pose-estimation stack
//! - `AnalysisPipeline`: identity tracking, exercise coordination, and
//!   surveillance for one frame, synchronously
//! - `SessionWorker`: a background thread running the loop and publishing
//!   `SessionSnapshot`s under a mutex for polling readers
//! - `PipelineConfig`: layered defaults-plus-file configuration

pub mod pipeline;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod worker;

pub use pipeline::{AnalysisPipeline, FrameSummary};
pub use settings::PipelineConfig;
pub use snapshot::{FrameDigest, SessionSnapshot};
pub use source::{FrameInput, PersonObservation, PoseSource};
pub use worker::{SessionHandle, SessionWorker};

use thiserror::Error;
use uuid::Uuid;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("configuration load failed: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// Generate a fresh session identifier
pub fn generate_session_id() -> String {
    format!("session_{}", Uuid::new_v4())
}
