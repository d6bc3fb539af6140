//! The device tracking engine.
//!
//! One sampling loop per tracked device: each tick pulls a position fix,
//! persists the location, then evaluates safe zones and speed as sequential
//! best-effort side effects. Loops are cancelled between ticks via a
//! per-device token; in-flight backend calls of the current tick complete
//! normally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics::{counter, gauge};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use client::ReverseGeocoder;
use domain::models::{
    AlertKind, AlertSeverity, DeviceStatusUpdate, EmergencyAlertRequest, LocationAlert, NewAlert,
    NewDevice, NewSafeZone, PositionFix, SafeZone, TrackedDevice, TrackingSettingsPatch,
};
use domain::services::{evaluate_speed, evaluate_zone, TrackingApi};

use crate::error::TrackerError;
use crate::position::PositionError;
use crate::sampler::PositionSampler;

/// Default number of alerts returned by [`DeviceTracker::device_alerts`].
pub const DEFAULT_ALERT_LIMIT: usize = 50;

/// Outcome of one emergency dispatch attempt.
#[derive(Debug, Clone)]
pub struct ContactDispatch {
    pub contact_id: Uuid,
    pub contact_name: String,
    /// Failure description; `None` when the dispatch was accepted.
    pub error: Option<String>,
}

impl ContactDispatch {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-contact report from an emergency escalation.
#[derive(Debug, Clone)]
pub struct EmergencyDispatchReport {
    pub device_id: Uuid,
    pub dispatches: Vec<ContactDispatch>,
}

impl EmergencyDispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.dispatches.iter().all(ContactDispatch::delivered)
    }

    pub fn failed_count(&self) -> usize {
        self.dispatches.iter().filter(|d| !d.delivered()).count()
    }
}

/// The tracking engine. Explicitly constructed; hold it behind an `Arc` at
/// the application root.
///
/// The only local state is the map of active sampling loops; everything else
/// is owned by the backend behind [`TrackingApi`].
pub struct DeviceTracker {
    api: Arc<dyn TrackingApi>,
    sampler: Arc<PositionSampler>,
    geocoder: Arc<ReverseGeocoder>,
    watches: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl DeviceTracker {
    pub fn new(
        api: Arc<dyn TrackingApi>,
        sampler: PositionSampler,
        geocoder: ReverseGeocoder,
    ) -> Self {
        Self {
            api,
            sampler: Arc::new(sampler),
            geocoder: Arc::new(geocoder),
            watches: Mutex::new(HashMap::new()),
        }
    }

    /// Create a device record on the backend.
    pub async fn register_device(&self, new: NewDevice) -> Result<TrackedDevice, TrackerError> {
        Ok(self.api.register_device(new).await?)
    }

    /// Fetch a device record.
    pub async fn device(&self, device_id: Uuid) -> Result<TrackedDevice, TrackerError> {
        Ok(self.api.device(device_id).await?)
    }

    /// All devices registered to a student.
    pub async fn student_devices(&self, student_id: i64) -> Result<Vec<TrackedDevice>, TrackerError> {
        Ok(self.api.student_devices(student_id).await?)
    }

    /// All devices a parent may monitor.
    pub async fn parent_devices(&self, parent_id: i64) -> Result<Vec<TrackedDevice>, TrackerError> {
        Ok(self.api.parent_devices(parent_id).await?)
    }

    /// Whether a sampling loop is currently active for the device.
    pub fn is_tracking(&self, device_id: Uuid) -> bool {
        self.watches
            .lock()
            .expect("watch map poisoned")
            .contains_key(&device_id)
    }

    /// Start the sampling loop for a device and mark it active.
    ///
    /// Restarting an already-tracked device replaces its loop, picking up
    /// fresh settings and zones.
    pub async fn start_tracking(&self, device_id: Uuid) -> Result<(), TrackerError> {
        let device = self.api.device(device_id).await?;

        let token = CancellationToken::new();
        let replaced = {
            let mut watches = self.watches.lock().expect("watch map poisoned");
            watches.insert(device_id, token.clone())
        };
        if let Some(previous) = replaced {
            previous.cancel();
        } else {
            gauge!("edutrack_tracked_devices").increment(1.0);
        }

        info!(
            device_id = %device_id,
            interval_secs = device.tracking_settings.sample_interval().as_secs(),
            zones = device.safe_zones.len(),
            "Starting tracking"
        );

        let api = Arc::clone(&self.api);
        let sampler = Arc::clone(&self.sampler);
        tokio::spawn(run_tracking_loop(api, sampler, device, token));

        self.api
            .update_device_status(device_id, DeviceStatusUpdate::active(true))
            .await?;
        Ok(())
    }

    /// Cancel the sampling loop (no-op if untracked) and mark the device
    /// inactive.
    pub async fn stop_tracking(&self, device_id: Uuid) -> Result<(), TrackerError> {
        let removed = self
            .watches
            .lock()
            .expect("watch map poisoned")
            .remove(&device_id);
        if let Some(token) = removed {
            token.cancel();
            gauge!("edutrack_tracked_devices").decrement(1.0);
            info!(device_id = %device_id, "Stopping tracking");
        }

        self.api
            .update_device_status(device_id, DeviceStatusUpdate::active(false))
            .await?;
        Ok(())
    }

    /// Escalate a device to emergency mode.
    ///
    /// Raises the sampling frequency to every 30 seconds, notifies every
    /// emergency contact in parallel, and records a critical emergency
    /// alert. One contact failing never blocks the others; the report
    /// carries the per-contact outcomes.
    pub async fn activate_emergency_mode(
        &self,
        device_id: Uuid,
    ) -> Result<EmergencyDispatchReport, TrackerError> {
        let device = self.api.device(device_id).await?;

        self.api
            .update_settings(device_id, TrackingSettingsPatch::emergency())
            .await?;

        let mut handles = Vec::with_capacity(device.emergency_contacts.len());
        for contact in &device.emergency_contacts {
            let api = Arc::clone(&self.api);
            let request = EmergencyAlertRequest {
                device_id,
                contact_id: contact.id,
                message: format!(
                    "EMERGENCY: {} needs immediate assistance",
                    device.device_name
                ),
                location: device.current_location.clone(),
            };
            handles.push((
                contact.id,
                contact.name.clone(),
                tokio::spawn(async move { api.send_emergency_alert(request).await }),
            ));
        }

        let mut dispatches = Vec::with_capacity(handles.len());
        for (contact_id, contact_name, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => {
                    warn!(
                        device_id = %device_id,
                        contact_id = %contact_id,
                        error = %e,
                        "Emergency dispatch failed"
                    );
                    Some(e.to_string())
                }
                Err(e) => {
                    error!(contact_id = %contact_id, error = %e, "Emergency dispatch task failed");
                    Some(format!("dispatch task failed: {e}"))
                }
            };
            dispatches.push(ContactDispatch {
                contact_id,
                contact_name,
                error: outcome,
            });
        }

        record_alert(
            self.api.as_ref(),
            NewAlert::new(
                device_id,
                AlertKind::Emergency,
                format!("Emergency mode activated for {}", device.device_name),
                device.current_location.clone(),
                AlertSeverity::Critical,
            ),
        )
        .await;

        // A live loop keeps its old interval; replace it so the raised
        // frequency takes effect now.
        if self.is_tracking(device_id) {
            self.start_tracking(device_id).await?;
        }

        counter!("edutrack_emergency_activations_total").increment(1);
        Ok(EmergencyDispatchReport {
            device_id,
            dispatches,
        })
    }

    /// Record a battery reading, alerting when it reaches the device's
    /// configured alert level.
    pub async fn report_battery(&self, device_id: Uuid, level: i32) -> Result<(), TrackerError> {
        let device = self.api.device(device_id).await?;

        self.api
            .update_device_status(device_id, DeviceStatusUpdate::battery(level))
            .await?;

        if level <= device.tracking_settings.battery_alert_level {
            record_alert(
                self.api.as_ref(),
                NewAlert::new(
                    device_id,
                    AlertKind::Battery,
                    format!("{} battery at {level}%", device.device_name),
                    device.current_location.clone(),
                    AlertSeverity::Medium,
                ),
            )
            .await;
        }
        Ok(())
    }

    /// One-shot position read with resolved address.
    pub async fn locate(&self) -> Result<PositionFix, TrackerError> {
        let fix = self.sampler.one_shot().await?;
        Ok(self
            .geocoder
            .reverse_geocode(fix.latitude, fix.longitude)
            .await)
    }

    /// Attach a safe zone to a device.
    pub async fn add_safe_zone(
        &self,
        device_id: Uuid,
        zone: NewSafeZone,
    ) -> Result<SafeZone, TrackerError> {
        Ok(self.api.add_safe_zone(device_id, zone).await?)
    }

    /// Partially update a device's tracking settings.
    pub async fn update_tracking_settings(
        &self,
        device_id: Uuid,
        patch: TrackingSettingsPatch,
    ) -> Result<(), TrackerError> {
        Ok(self.api.update_settings(device_id, patch).await?)
    }

    /// Most recent alerts for a device, newest first.
    pub async fn device_alerts(
        &self,
        device_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<LocationAlert>, TrackerError> {
        Ok(self
            .api
            .device_alerts(device_id, limit.unwrap_or(DEFAULT_ALERT_LIMIT))
            .await?)
    }
}

/// Per-device sampling loop. The device snapshot (zones, contacts,
/// settings) is frozen at start; restarting the loop picks up changes.
async fn run_tracking_loop(
    api: Arc<dyn TrackingApi>,
    sampler: Arc<PositionSampler>,
    device: TrackedDevice,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(device.tracking_settings.sample_interval());
    info!(device_id = %device.id, "Tracking loop started");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!(device_id = %device.id, "Tracking loop stopped");
                break;
            }
            _ = interval.tick() => {
                match sampler.watch_sample().await {
                    Ok(fix) => process_sample(api.as_ref(), &device, &fix).await,
                    Err(error) => handle_tracking_error(api.as_ref(), device.id, &error).await,
                }
            }
        }
    }
}

/// Run one position fix through the per-tick pipeline.
///
/// The previous fix is read before the push so the speed check compares
/// consecutive samples. Each step is best effort: a failed backend call is
/// logged and the remaining steps still run.
pub(crate) async fn process_sample(api: &dyn TrackingApi, device: &TrackedDevice, fix: &PositionFix) {
    counter!("edutrack_positions_processed_total").increment(1);

    let previous = match api.last_location(device.id).await {
        Ok(previous) => previous,
        Err(e) => {
            warn!(device_id = %device.id, error = %e, "Failed to fetch last location");
            None
        }
    };

    if let Err(e) = api.push_location(device.id, fix).await {
        warn!(device_id = %device.id, error = %e, "Failed to push location");
    }

    check_safe_zones(api, device, fix).await;

    if let Some(previous) = previous {
        check_speed(api, device, &previous, fix).await;
    }
}

/// Evaluate every applicable zone and persist the fresh membership state.
///
/// Membership reads that fail default to "outside", matching the backend's
/// answer for a device it has never seen in the zone.
pub(crate) async fn check_safe_zones(api: &dyn TrackingApi, device: &TrackedDevice, fix: &PositionFix) {
    for zone in &device.safe_zones {
        let was_in_zone = match api.zone_status(device.id, zone.id).await {
            Ok(state) => state,
            Err(e) => {
                warn!(device_id = %device.id, zone_id = %zone.id, error = %e, "Failed to fetch zone status");
                false
            }
        };

        let Some(evaluation) = evaluate_zone(device, zone, fix, was_in_zone, Utc::now()) else {
            continue;
        };

        if let Some(alert) = evaluation.alert {
            record_alert(api, alert).await;
        }

        if let Err(e) = api
            .set_zone_status(device.id, zone.id, evaluation.is_in_zone)
            .await
        {
            warn!(device_id = %device.id, zone_id = %zone.id, error = %e, "Failed to persist zone status");
        }
    }
}

/// Derive the speed between consecutive samples and alert above threshold.
pub(crate) async fn check_speed(
    api: &dyn TrackingApi,
    device: &TrackedDevice,
    previous: &PositionFix,
    current: &PositionFix,
) {
    if let Some(alert) = evaluate_speed(device, previous, current) {
        record_alert(api, alert).await;
    }
}

/// Position-source failures surface as offline alerts; the loop keeps
/// running.
pub(crate) async fn handle_tracking_error(
    api: &dyn TrackingApi,
    device_id: Uuid,
    error: &PositionError,
) {
    error!(device_id = %device_id, error = %error, "Location tracking error");
    record_alert(
        api,
        NewAlert::new(
            device_id,
            AlertKind::Offline,
            format!("{device_id} tracking error: {error}"),
            None,
            AlertSeverity::Medium,
        ),
    )
    .await;
}

/// Record an alert, logging (not propagating) backend failures.
pub(crate) async fn record_alert(api: &dyn TrackingApi, alert: NewAlert) {
    counter!("edutrack_alerts_emitted_total", "kind" => alert.kind.as_str()).increment(1);
    if let Err(e) = api.create_alert(alert).await {
        warn!(error = %e, "Failed to record alert");
    }
}
