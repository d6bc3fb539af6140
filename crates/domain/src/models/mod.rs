//! Domain models for Edutrack.

pub mod alert;
pub mod city;
pub mod contact;
pub mod device;
pub mod position;
pub mod safe_zone;

pub use alert::{AlertKind, AlertSeverity, EmergencyAlertRequest, LocationAlert, NewAlert};
pub use contact::EmergencyContact;
pub use device::{
    DeviceStatusUpdate, DeviceType, NewDevice, TrackedDevice, TrackingSettings,
    TrackingSettingsPatch,
};
pub use position::PositionFix;
pub use safe_zone::{NewSafeZone, SafeZone, SafeZoneKind, TimeRestrictions, TimeWindow};
