//! Alert data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use person_tracking::PersonId;
use pose_geometry::Point2;

/// Types of surveillance alerts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PersonDetected,
    RestrictedZoneEntry,
    RapidMovement,
    Loitering,
    FallDetected,
}

impl AlertType {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::PersonDetected => "person detected",
            AlertType::RestrictedZoneEntry => "restricted zone entry",
            AlertType::RapidMovement => "rapid movement",
            AlertType::Loitering => "loitering",
            AlertType::FallDetected => "fall detected",
        }
    }
}

/// A single surveillance alert.
///
/// Immutable once created except for `resolved`, flipped exactly once by an
/// external review action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub timestamp: DateTime<Utc>,
    pub person_id: PersonId,
    pub location: Point2,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    pub description: String,
    pub resolved: bool,
}

impl Alert {
    /// Create an unresolved alert
    pub fn new(
        alert_type: AlertType,
        timestamp: DateTime<Utc>,
        person_id: PersonId,
        location: Point2,
        confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            timestamp,
            person_id,
            location,
            confidence,
            description: description.into(),
            resolved: false,
        }
    }
}
