//! Safe-zone domain model.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A named circular geofence owned by a single tracked device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeZone {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in metres.
    pub radius: f64,
    #[serde(rename = "type")]
    pub kind: SafeZoneKind,
    pub is_active: bool,
    pub entry_notification: bool,
    pub exit_notification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_restrictions: Option<TimeRestrictions>,
}

impl SafeZone {
    /// Distance from a position to the zone center, in metres.
    pub fn distance_m(&self, latitude: f64, longitude: f64) -> f64 {
        shared::geo::haversine_distance_m(latitude, longitude, self.latitude, self.longitude)
    }

    /// Whether a position lies within the zone. The boundary counts as inside.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.distance_m(latitude, longitude) <= self.radius
    }

    /// Whether the zone applies at the given instant.
    ///
    /// Zones without time restrictions apply at all times.
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        match &self.time_restrictions {
            Some(restrictions) => restrictions.allows(at),
            None => true,
        }
    }
}

/// Safe-zone categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafeZoneKind {
    School,
    Home,
    Family,
    Friend,
    Activity,
}

impl SafeZoneKind {
    /// Converts to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeZoneKind::School => "school",
            SafeZoneKind::Home => "home",
            SafeZoneKind::Family => "family",
            SafeZoneKind::Friend => "friend",
            SafeZoneKind::Activity => "activity",
        }
    }

    /// Parses from wire string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "school" => Some(SafeZoneKind::School),
            "home" => Some(SafeZoneKind::Home),
            "family" => Some(SafeZoneKind::Family),
            "friend" => Some(SafeZoneKind::Friend),
            "activity" => Some(SafeZoneKind::Activity),
            _ => None,
        }
    }
}

/// Time-of-day/day-of-week restriction attached to a zone.
///
/// Days are numbered 0-6, Sunday-based, matching the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestrictions {
    #[validate(nested)]
    pub allowed_hours: Vec<TimeWindow>,
    pub allowed_days: Vec<u8>,
}

impl TimeRestrictions {
    /// Whether the restriction admits the given instant.
    ///
    /// An empty day list admits every day; an empty hour list admits every
    /// time of day.
    pub fn allows(&self, at: DateTime<Utc>) -> bool {
        let day = at.weekday().num_days_from_sunday() as u8;
        if !self.allowed_days.is_empty() && !self.allowed_days.contains(&day) {
            return false;
        }

        if self.allowed_hours.is_empty() {
            return true;
        }

        let time = NaiveTime::from_hms_opt(at.hour(), at.minute(), 0)
            .unwrap_or(NaiveTime::MIN);
        self.allowed_hours.iter().any(|w| w.contains(time))
    }
}

/// A clock window bounded by "HH:MM" strings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub start: String,
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub end: String,
}

impl TimeWindow {
    /// Whether the window contains the given time of day.
    ///
    /// A window whose end precedes its start wraps past midnight
    /// (e.g. 21:00-06:00).
    pub fn contains(&self, time: NaiveTime) -> bool {
        let (Some(start), Some(end)) = (parse_clock(&self.start), parse_clock(&self.end)) else {
            return false;
        };
        if start <= end {
            time >= start && time <= end
        } else {
            time >= start || time <= end
        }
    }
}

fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Default active status for new safe zones.
fn default_active() -> bool {
    true
}

/// Request payload for creating a safe zone on a device.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSafeZone {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Radius in metres.
    #[validate(range(min = 20.0, max = 50000.0, message = "Radius must be between 20 and 50000 meters"))]
    pub radius: f64,

    #[serde(rename = "type")]
    pub kind: SafeZoneKind,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default = "default_active")]
    pub entry_notification: bool,

    #[serde(default = "default_active")]
    pub exit_notification: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub time_restrictions: Option<TimeRestrictions>,
}

impl NewSafeZone {
    /// Materialize the zone with a backend-assigned identifier.
    pub fn into_zone(self, id: Uuid) -> SafeZone {
        SafeZone {
            id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            radius: self.radius,
            kind: self.kind,
            is_active: self.is_active,
            entry_notification: self.entry_notification,
            exit_notification: self.exit_notification,
            time_restrictions: self.time_restrictions,
        }
    }
}
