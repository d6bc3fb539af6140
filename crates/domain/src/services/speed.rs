//! Speed evaluation between consecutive position samples.

use crate::models::alert::{AlertKind, AlertSeverity, NewAlert};
use crate::models::device::TrackedDevice;
use crate::models::position::PositionFix;

/// Speed above which a speed alert escalates to high severity, in km/h.
pub const HIGH_SPEED_THRESHOLD_KMH: f64 = 80.0;

/// Average speed between two samples, in km/h.
///
/// Returns `None` when the elapsed time is zero or negative (out-of-order or
/// duplicated samples), which would otherwise produce an infinite or
/// meaningless speed.
pub fn speed_between_kmh(previous: &PositionFix, current: &PositionFix) -> Option<f64> {
    let elapsed_ms = current
        .timestamp
        .signed_duration_since(previous.timestamp)
        .num_milliseconds();
    if elapsed_ms <= 0 {
        return None;
    }
    let hours = elapsed_ms as f64 / 3_600_000.0;
    Some(previous.kilometres_to(current) / hours)
}

/// Evaluate a sample pair against the device's speed alert threshold.
///
/// Returns the alert to record when the derived speed exceeds the threshold:
/// high severity above [`HIGH_SPEED_THRESHOLD_KMH`], medium otherwise.
pub fn evaluate_speed(
    device: &TrackedDevice,
    previous: &PositionFix,
    current: &PositionFix,
) -> Option<NewAlert> {
    let speed = speed_between_kmh(previous, current)?;
    if speed <= device.tracking_settings.speed_alert_threshold {
        return None;
    }

    let severity = if speed > HIGH_SPEED_THRESHOLD_KMH {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    };

    Some(NewAlert::new(
        device.id,
        AlertKind::Speed,
        format!("{} traveling at {:.1} km/h", device.device_name, speed),
        Some(current.clone()),
        severity,
    ))
}
