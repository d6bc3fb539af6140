//! Location alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::position::PositionFix;

/// Alert categories emitted by the tracking engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Entry,
    Exit,
    Emergency,
    Speed,
    Battery,
    Offline,
}

impl AlertKind {
    /// Converts to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Entry => "entry",
            AlertKind::Exit => "exit",
            AlertKind::Emergency => "emergency",
            AlertKind::Speed => "speed",
            AlertKind::Battery => "battery",
            AlertKind::Offline => "offline",
        }
    }

    /// Parses from wire string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(AlertKind::Entry),
            "exit" => Some(AlertKind::Exit),
            "emergency" => Some(AlertKind::Emergency),
            "speed" => Some(AlertKind::Speed),
            "battery" => Some(AlertKind::Battery),
            "offline" => Some(AlertKind::Offline),
            _ => None,
        }
    }
}

/// Alert severity scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Converts to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// An immutable alert event recorded against a device.
///
/// Only `is_read` changes after creation, and only on the backend side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAlert {
    pub id: Uuid,
    pub device_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PositionFix>,
    pub is_read: bool,
    pub severity: AlertSeverity,
}

/// Payload for recording a new alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub device_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PositionFix>,
    pub is_read: bool,
    pub severity: AlertSeverity,
}

impl NewAlert {
    /// Build an unread alert stamped with the current time.
    pub fn new(
        device_id: Uuid,
        kind: AlertKind,
        message: impl Into<String>,
        location: Option<PositionFix>,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            device_id,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            location,
            is_read: false,
            severity,
        }
    }

    /// Materialize the stored alert with a backend-assigned identifier.
    pub fn into_alert(self, id: Uuid) -> LocationAlert {
        LocationAlert {
            id,
            device_id: self.device_id,
            kind: self.kind,
            message: self.message,
            timestamp: self.timestamp,
            location: self.location,
            is_read: self.is_read,
            severity: self.severity,
        }
    }
}

/// Fan-out notification sent to a single emergency contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlertRequest {
    pub device_id: Uuid,
    pub contact_id: Uuid,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PositionFix>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_kind_serialization() {
        assert_eq!(serde_json::to_string(&AlertKind::Entry).unwrap(), "\"entry\"");
        assert_eq!(
            serde_json::to_string(&AlertKind::Offline).unwrap(),
            "\"offline\""
        );
    }

    #[test]
    fn test_alert_kind_round_trip() {
        for kind in [
            AlertKind::Entry,
            AlertKind::Exit,
            AlertKind::Emergency,
            AlertKind::Speed,
            AlertKind::Battery,
            AlertKind::Offline,
        ] {
            assert_eq!(AlertKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(AlertKind::from_str("geofence"), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::Medium < AlertSeverity::High);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }

    #[test]
    fn test_new_alert_starts_unread() {
        let alert = NewAlert::new(
            Uuid::new_v4(),
            AlertKind::Speed,
            "Tablette d'Amina traveling at 92.4 km/h",
            None,
            AlertSeverity::High,
        );
        assert!(!alert.is_read);
        assert_eq!(alert.severity, AlertSeverity::High);
    }

    #[test]
    fn test_new_alert_serializes_kind_as_type() {
        let alert = NewAlert::new(
            Uuid::new_v4(),
            AlertKind::Exit,
            "left school",
            None,
            AlertSeverity::Medium,
        );
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"type\":\"exit\""));
        assert!(json.contains("\"isRead\":false"));
        assert!(!json.contains("\"location\""));
    }

    #[test]
    fn test_into_alert_preserves_fields() {
        let new = NewAlert::new(
            Uuid::new_v4(),
            AlertKind::Battery,
            "battery low",
            None,
            AlertSeverity::Medium,
        );
        let device_id = new.device_id;
        let id = Uuid::new_v4();
        let alert = new.into_alert(id);
        assert_eq!(alert.id, id);
        assert_eq!(alert.device_id, device_id);
        assert_eq!(alert.kind, AlertKind::Battery);
    }

    #[test]
    fn test_location_alert_wire_round_trip() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "deviceId": "550e8400-e29b-41d4-a716-446655440001",
            "type": "entry",
            "message": "Montre de Kofi entered Maison",
            "timestamp": "2026-03-02T07:45:00Z",
            "isRead": false,
            "severity": "low"
        }"#;
        let alert: LocationAlert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.kind, AlertKind::Entry);
        assert_eq!(alert.severity, AlertSeverity::Low);
        assert!(alert.location.is_none());
    }
}
