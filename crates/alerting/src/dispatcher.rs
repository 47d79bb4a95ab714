//! Alert delivery with per-(type, person) cooldown

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use person_tracking::PersonId;

use crate::alert::{Alert, AlertType};

/// Delivery sink for alerts raised by the analysis engines.
///
/// The implementation decides whether an alert is actually emitted; `false`
/// means it was suppressed. Callers must never assume delivery.
pub trait AlertSink {
    /// Submit an alert for delivery, returning whether it was emitted
    fn submit(&mut self, alert: &Alert, session_id: &str) -> bool;
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Minimum time between two delivered alerts of the same type for the
    /// same person (seconds)
    pub cooldown_seconds: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { cooldown_seconds: 5.0 }
    }
}

/// Cooldown-applying dispatcher.
///
/// A duplicate (type, person) alert within the cooldown window is silently
/// dropped: not queued, not merged. Cooldown is keyed on alert timestamps
/// rather than a wall clock so suppression is deterministic under test.
pub struct AlertDispatcher {
    config: DispatcherConfig,
    last_fired: HashMap<(AlertType, PersonId), DateTime<Utc>>,
    fired_by_type: HashMap<AlertType, u64>,
    suppressed: u64,
}

impl AlertDispatcher {
    /// Create a dispatcher with the given configuration
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            last_fired: HashMap::new(),
            fired_by_type: HashMap::new(),
            suppressed: 0,
        }
    }

    fn cooled_down(&self, alert: &Alert) -> bool {
        match self.last_fired.get(&(alert.alert_type, alert.person_id)) {
            Some(last) => {
                let elapsed = (alert.timestamp - *last).num_milliseconds() as f64 / 1000.0;
                elapsed < self.config.cooldown_seconds
            }
            None => false,
        }
    }

    /// Alerts delivered for a given type
    pub fn fired_count(&self, alert_type: AlertType) -> u64 {
        self.fired_by_type.get(&alert_type).copied().unwrap_or(0)
    }

    /// Alerts dropped by the cooldown
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Forget all cooldown state and statistics
    pub fn clear(&mut self) {
        self.last_fired.clear();
        self.fired_by_type.clear();
        self.suppressed = 0;
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl AlertSink for AlertDispatcher {
    fn submit(&mut self, alert: &Alert, session_id: &str) -> bool {
        if self.cooled_down(alert) {
            self.suppressed += 1;
            debug!(
                person_id = alert.person_id,
                alert_type = ?alert.alert_type,
                "alert suppressed by cooldown"
            );
            return false;
        }

        self.last_fired
            .insert((alert.alert_type, alert.person_id), alert.timestamp);
        *self.fired_by_type.entry(alert.alert_type).or_insert(0) += 1;

        info!(
            session_id,
            person_id = alert.person_id,
            alert_type = ?alert.alert_type,
            confidence = alert.confidence,
            "{}",
            alert.description
        );
        true
    }
}

/// Sink that accepts and discards every alert; for tests and headless runs
pub struct NullSink;

impl AlertSink for NullSink {
    fn submit(&mut self, _alert: &Alert, _session_id: &str) -> bool {
        true
    }
}
