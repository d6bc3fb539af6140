//! Tracked-device domain model.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::contact::EmergencyContact;
use crate::models::position::PositionFix;
use crate::models::safe_zone::SafeZone;

/// A student device registered for tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedDevice {
    pub id: Uuid,
    pub student_id: i64,
    pub device_type: DeviceType,
    pub device_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub is_active: bool,
    pub last_seen: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<PositionFix>,
    pub safe_zones: Vec<SafeZone>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub tracking_settings: TrackingSettings,
}

/// Supported device categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Tablet,
    Smartwatch,
    Phone,
}

impl DeviceType {
    /// Converts to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Tablet => "tablet",
            DeviceType::Smartwatch => "smartwatch",
            DeviceType::Phone => "phone",
        }
    }

    /// Parses from wire string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tablet" => Some(DeviceType::Tablet),
            "smartwatch" => Some(DeviceType::Smartwatch),
            "phone" => Some(DeviceType::Phone),
            _ => None,
        }
    }
}

/// Per-device tracking configuration, replaced wholesale via partial update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSettings {
    /// Minutes between location samples (0.5 = every 30 seconds).
    pub location_frequency: f64,

    /// Battery percentage at or below which a battery alert fires.
    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_alert_level: i32,

    /// Speed in km/h above which a speed alert fires.
    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed_alert_threshold: f64,

    /// Start of the night-mode window, "HH:MM".
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub night_mode_start: String,

    /// End of the night-mode window, "HH:MM".
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub night_mode_end: String,

    pub share_location_with_teachers: bool,
    pub share_location_with_school: bool,
    pub emergency_mode: bool,
    pub parental_controls_enabled: bool,
}

impl TrackingSettings {
    /// Sampling frequency applied while emergency mode is active (30 seconds).
    pub const EMERGENCY_LOCATION_FREQUENCY: f64 = 0.5;

    /// The night-mode window as parsed clock times, if both bounds are well
    /// formed.
    pub fn night_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.night_mode_start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&self.night_mode_end, "%H:%M").ok()?;
        Some((start, end))
    }

    /// Sampling interval derived from the configured frequency.
    pub fn sample_interval(&self) -> std::time::Duration {
        let secs = (self.location_frequency * 60.0).max(1.0);
        std::time::Duration::from_secs_f64(secs)
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            location_frequency: 5.0,
            battery_alert_level: 20,
            speed_alert_threshold: 60.0,
            night_mode_start: "21:00".to_string(),
            night_mode_end: "06:00".to_string(),
            share_location_with_teachers: false,
            share_location_with_school: true,
            emergency_mode: false,
            parental_controls_enabled: true,
        }
    }
}

/// Partial update for tracking settings. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_frequency: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_alert_level: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed_alert_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub night_mode_start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_clock_string"))]
    pub night_mode_end: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_location_with_teachers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_location_with_school: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_mode: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parental_controls_enabled: Option<bool>,
}

impl TrackingSettingsPatch {
    /// The patch applied during emergency escalation.
    pub fn emergency() -> Self {
        Self {
            location_frequency: Some(TrackingSettings::EMERGENCY_LOCATION_FREQUENCY),
            emergency_mode: Some(true),
            ..Self::default()
        }
    }

    /// Apply the patch to a settings value in place.
    pub fn apply_to(&self, settings: &mut TrackingSettings) {
        if let Some(v) = self.location_frequency {
            settings.location_frequency = v;
        }
        if let Some(v) = self.battery_alert_level {
            settings.battery_alert_level = v;
        }
        if let Some(v) = self.speed_alert_threshold {
            settings.speed_alert_threshold = v;
        }
        if let Some(v) = &self.night_mode_start {
            settings.night_mode_start = v.clone();
        }
        if let Some(v) = &self.night_mode_end {
            settings.night_mode_end = v.clone();
        }
        if let Some(v) = self.share_location_with_teachers {
            settings.share_location_with_teachers = v;
        }
        if let Some(v) = self.share_location_with_school {
            settings.share_location_with_school = v;
        }
        if let Some(v) = self.emergency_mode {
            settings.emergency_mode = v;
        }
        if let Some(v) = self.parental_controls_enabled {
            settings.parental_controls_enabled = v;
        }
    }
}

/// Registration payload for a new device.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub student_id: i64,

    pub device_type: DeviceType,

    #[validate(length(min = 1, max = 100, message = "Device name must be 1-100 characters"))]
    pub device_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    #[serde(default)]
    pub safe_zones: Vec<SafeZone>,

    #[serde(default)]
    #[validate(nested)]
    pub emergency_contacts: Vec<EmergencyContact>,

    #[validate(nested)]
    pub tracking_settings: TrackingSettings,
}

impl NewDevice {
    /// Materialize the device record with a backend-assigned identifier.
    ///
    /// New devices start inactive; tracking is started explicitly.
    pub fn into_device(self, id: Uuid, now: DateTime<Utc>) -> TrackedDevice {
        TrackedDevice {
            id,
            student_id: self.student_id,
            device_type: self.device_type,
            device_name: self.device_name,
            mac_address: self.mac_address,
            imei: self.imei,
            battery_level: self.battery_level,
            is_active: false,
            last_seen: now,
            current_location: None,
            safe_zones: self.safe_zones,
            emergency_contacts: self.emergency_contacts,
            tracking_settings: self.tracking_settings,
        }
    }
}

/// Mutable device status fields, PATCHed by the tracking engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
}

impl DeviceStatusUpdate {
    /// Mark the device active or inactive as of now.
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            last_seen: Some(Utc::now()),
            battery_level: None,
        }
    }

    /// Record a fresh battery reading.
    pub fn battery(level: i32) -> Self {
        Self {
            is_active: None,
            last_seen: Some(Utc::now()),
            battery_level: Some(level),
        }
    }
}
