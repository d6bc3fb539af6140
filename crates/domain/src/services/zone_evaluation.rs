//! Safe-zone transition evaluation.
//!
//! Pure edge detection: the caller supplies the previous membership state
//! (authoritative on the backend) and the evaluation reports the new state,
//! the transition if one occurred, and the alert to record for it. There is
//! no hysteresis: a device oscillating at the boundary produces one
//! transition per crossing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::alert::{AlertKind, AlertSeverity, NewAlert};
use crate::models::device::TrackedDevice;
use crate::models::position::PositionFix;
use crate::models::safe_zone::{SafeZone, SafeZoneKind};

/// Direction of a zone boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered,
    Exited,
}

/// Outcome of evaluating one zone against one position sample.
#[derive(Debug, Clone)]
pub struct ZoneEvaluation {
    pub zone_id: Uuid,
    /// Fresh membership state, persisted regardless of whether an alert fired.
    pub is_in_zone: bool,
    pub transition: Option<ZoneTransition>,
    /// Alert to record, present only for a crossing whose notification flag
    /// is enabled.
    pub alert: Option<NewAlert>,
}

/// Evaluate a single zone against a position sample.
///
/// Returns `None` when the zone is inactive or outside its allowed time
/// window; such zones are skipped entirely and their stored membership state
/// is left untouched.
pub fn evaluate_zone(
    device: &TrackedDevice,
    zone: &SafeZone,
    fix: &PositionFix,
    was_in_zone: bool,
    now: DateTime<Utc>,
) -> Option<ZoneEvaluation> {
    if !zone.is_active || !zone.applies_at(now) {
        return None;
    }

    let is_in_zone = zone.contains(fix.latitude, fix.longitude);

    let transition = match (was_in_zone, is_in_zone) {
        (false, true) => Some(ZoneTransition::Entered),
        (true, false) => Some(ZoneTransition::Exited),
        _ => None,
    };

    let alert = match transition {
        Some(ZoneTransition::Entered) if zone.entry_notification => Some(NewAlert::new(
            device.id,
            AlertKind::Entry,
            format!("{} entered {}", device.device_name, zone.name),
            Some(fix.clone()),
            AlertSeverity::Low,
        )),
        Some(ZoneTransition::Exited) if zone.exit_notification => Some(NewAlert::new(
            device.id,
            AlertKind::Exit,
            format!("{} left {}", device.device_name, zone.name),
            Some(fix.clone()),
            exit_severity(zone.kind),
        )),
        _ => None,
    };

    Some(ZoneEvaluation {
        zone_id: zone.id,
        is_in_zone,
        transition,
        alert,
    })
}

/// Leaving a school zone is more serious than leaving any other zone.
fn exit_severity(kind: SafeZoneKind) -> AlertSeverity {
    match kind {
        SafeZoneKind::School => AlertSeverity::Medium,
        _ => AlertSeverity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::{DeviceType, TrackingSettings};
    use crate::models::safe_zone::{TimeRestrictions, TimeWindow};
    use chrono::TimeZone;

    const SCHOOL: (f64, f64) = (3.8480, 11.5021);

    fn device() -> TrackedDevice {
        TrackedDevice {
            id: Uuid::new_v4(),
            student_id: 7,
            device_type: DeviceType::Smartwatch,
            device_name: "Montre de Kofi".to_string(),
            mac_address: None,
            imei: None,
            battery_level: None,
            is_active: true,
            last_seen: Utc::now(),
            current_location: None,
            safe_zones: vec![],
            emergency_contacts: vec![],
            tracking_settings: TrackingSettings::default(),
        }
    }

    fn zone(kind: SafeZoneKind) -> SafeZone {
        SafeZone {
            id: Uuid::new_v4(),
            name: "Zone test".to_string(),
            latitude: SCHOOL.0,
            longitude: SCHOOL.1,
            radius: 500.0,
            kind,
            is_active: true,
            entry_notification: true,
            exit_notification: true,
            time_restrictions: None,
        }
    }

    /// ~300 m from the zone center.
    fn fix_inside() -> PositionFix {
        PositionFix::new(SCHOOL.0 + 0.0027, SCHOOL.1, 10.0, Utc::now())
    }

    /// ~1.1 km from the zone center.
    fn fix_outside() -> PositionFix {
        PositionFix::new(SCHOOL.0 + 0.01, SCHOOL.1, 10.0, Utc::now())
    }

    #[test]
    fn test_entry_emits_low_severity_alert() {
        let eval =
            evaluate_zone(&device(), &zone(SafeZoneKind::School), &fix_inside(), false, Utc::now())
                .unwrap();
        assert!(eval.is_in_zone);
        assert_eq!(eval.transition, Some(ZoneTransition::Entered));
        let alert = eval.alert.unwrap();
        assert_eq!(alert.kind, AlertKind::Entry);
        assert_eq!(alert.severity, AlertSeverity::Low);
        assert!(alert.message.contains("entered"));
        assert!(alert.location.is_some());
    }

    #[test]
    fn test_school_exit_is_medium_severity() {
        let eval =
            evaluate_zone(&device(), &zone(SafeZoneKind::School), &fix_outside(), true, Utc::now())
                .unwrap();
        assert_eq!(eval.transition, Some(ZoneTransition::Exited));
        let alert = eval.alert.unwrap();
        assert_eq!(alert.kind, AlertKind::Exit);
        assert_eq!(alert.severity, AlertSeverity::Medium);
        assert!(alert.message.contains("left"));
    }

    #[test]
    fn test_home_exit_is_low_severity() {
        let eval =
            evaluate_zone(&device(), &zone(SafeZoneKind::Home), &fix_outside(), true, Utc::now())
                .unwrap();
        assert_eq!(eval.alert.unwrap().severity, AlertSeverity::Low);
    }

    #[test]
    fn test_no_transition_no_alert() {
        let eval =
            evaluate_zone(&device(), &zone(SafeZoneKind::School), &fix_inside(), true, Utc::now())
                .unwrap();
        assert!(eval.is_in_zone);
        assert!(eval.transition.is_none());
        assert!(eval.alert.is_none());

        let eval =
            evaluate_zone(&device(), &zone(SafeZoneKind::School), &fix_outside(), false, Utc::now())
                .unwrap();
        assert!(!eval.is_in_zone);
        assert!(eval.transition.is_none());
        assert!(eval.alert.is_none());
    }

    #[test]
    fn test_entry_without_notification_flag_updates_state_silently() {
        let mut z = zone(SafeZoneKind::Home);
        z.entry_notification = false;
        let eval = evaluate_zone(&device(), &z, &fix_inside(), false, Utc::now()).unwrap();
        assert!(eval.is_in_zone);
        assert_eq!(eval.transition, Some(ZoneTransition::Entered));
        assert!(eval.alert.is_none());
    }

    #[test]
    fn test_exit_without_notification_flag_updates_state_silently() {
        let mut z = zone(SafeZoneKind::School);
        z.exit_notification = false;
        let eval = evaluate_zone(&device(), &z, &fix_outside(), true, Utc::now()).unwrap();
        assert!(!eval.is_in_zone);
        assert!(eval.alert.is_none());
    }

    #[test]
    fn test_inactive_zone_is_skipped() {
        let mut z = zone(SafeZoneKind::School);
        z.is_active = false;
        assert!(evaluate_zone(&device(), &z, &fix_inside(), false, Utc::now()).is_none());
    }

    #[test]
    fn test_zone_outside_time_window_is_skipped() {
        let mut z = zone(SafeZoneKind::School);
        z.time_restrictions = Some(TimeRestrictions {
            allowed_hours: vec![TimeWindow {
                start: "07:00".to_string(),
                end: "15:00".to_string(),
            }],
            allowed_days: vec![],
        });
        let evening = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        assert!(evaluate_zone(&device(), &z, &fix_inside(), false, evening).is_none());

        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        assert!(evaluate_zone(&device(), &z, &fix_inside(), false, morning).is_some());
    }

    #[test]
    fn test_boundary_oscillation_produces_one_alert_per_crossing() {
        // No hysteresis: every boundary crossing fires. This pins the known
        // alert-storm behavior for oscillating devices.
        let z = zone(SafeZoneKind::School);
        let d = device();
        let samples = [fix_inside(), fix_outside(), fix_inside(), fix_outside()];

        let mut was_in = false;
        let mut alerts = 0;
        for fix in &samples {
            let eval = evaluate_zone(&d, &z, fix, was_in, Utc::now()).unwrap();
            if eval.alert.is_some() {
                alerts += 1;
            }
            was_in = eval.is_in_zone;
        }
        assert_eq!(alerts, 4);
    }
}
