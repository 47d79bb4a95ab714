//! Restricted zones

use serde::{Deserialize, Serialize};

use alerting::AlertType;
use pose_geometry::{polygon_contains, Point2};

use crate::SurveillanceError;

/// Zone identifier
pub type ZoneId = u32;

/// On-disk zone record:
/// `{ zone_id, name, points: [[x, y], ...], alert_type, enabled }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub zone_id: ZoneId,
    pub name: String,
    pub points: Vec<[f64; 2]>,
    #[serde(default = "default_alert_type")]
    pub alert_type: AlertType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_alert_type() -> AlertType {
    AlertType::RestrictedZoneEntry
}

fn default_enabled() -> bool {
    true
}

/// A static restricted region, tested per frame per tracked person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictedZone {
    pub zone_id: ZoneId,
    pub name: String,
    pub points: Vec<Point2>,
    /// Alert raised on entry
    pub alert_type: AlertType,
    pub enabled: bool,
}

impl RestrictedZone {
    /// Create an enabled zone with the default entry alert type
    pub fn new(zone_id: ZoneId, name: impl Into<String>, points: Vec<Point2>) -> Self {
        Self {
            zone_id,
            name: name.into(),
            points,
            alert_type: default_alert_type(),
            enabled: true,
        }
    }

    /// Boundary-inclusive containment; disabled zones contain nothing
    pub fn contains(&self, point: Point2) -> bool {
        self.enabled && polygon_contains(&self.points, point)
    }
}

impl From<ZoneRecord> for RestrictedZone {
    fn from(record: ZoneRecord) -> Self {
        Self {
            zone_id: record.zone_id,
            name: record.name,
            points: record
                .points
                .into_iter()
                .map(|[x, y]| Point2::new(x, y))
                .collect(),
            alert_type: record.alert_type,
            enabled: record.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneFile {
    #[serde(default)]
    zones: Vec<ZoneRecord>,
}

/// Parse zone records from their JSON config form, keeping enabled zones only
pub fn parse_zones(json: &str) -> Result<Vec<RestrictedZone>, SurveillanceError> {
    let file: ZoneFile = serde_json::from_str(json)?;
    Ok(file
        .zones
        .into_iter()
        .filter(|record| record.enabled)
        .map(RestrictedZone::from)
        .collect())
}
