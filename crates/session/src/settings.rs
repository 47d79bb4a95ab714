//! Pipeline configuration

use serde::{Deserialize, Serialize};

use alerting::DispatcherConfig;
use exercise_engine::EngineConfig;
use person_tracking::TrackerConfig;
use surveillance::{SurveillanceConfig, ZoneRecord};

use crate::SessionError;

/// Configuration for the whole analysis pipeline.
///
/// Every section falls back to its documented defaults when absent from the
/// config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub engine: EngineConfig,
    pub surveillance: SurveillanceConfig,
    pub dispatcher: DispatcherConfig,
    /// Restricted zones in their config-record form
    pub zones: Vec<ZoneRecord>,
}

impl PipelineConfig {
    /// Load from an optional config file layered over defaults.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &str) -> Result<Self, SessionError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse from a JSON string (used by tests and embedded configs)
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(json, ::config::FileFormat::Json))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
