//! Alerting
//!
//! Alert handling for the surveillance engine:
//! - Typed alert records with human-readable descriptions
//! - The `AlertSink` delivery contract
//! - Cooldown-based deduplication per (alert type, person)

pub mod alert;
pub mod dispatcher;

pub use alert::{Alert, AlertType};
pub use dispatcher::{AlertDispatcher, AlertSink, DispatcherConfig, NullSink};
