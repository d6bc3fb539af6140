//! The seam to the remote tracking backend.
//!
//! All authoritative tracking state (device records, zone membership, alert
//! history) lives behind this trait. The HTTP implementation is in the
//! `client` crate; [`InMemoryTrackingApi`] serves development, demos and
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::alert::{EmergencyAlertRequest, LocationAlert, NewAlert};
use crate::models::device::{
    DeviceStatusUpdate, NewDevice, TrackedDevice, TrackingSettingsPatch,
};
use crate::models::position::PositionFix;
use crate::models::safe_zone::{NewSafeZone, SafeZone};

/// Errors surfaced by tracking backend implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Device not found: {0}")]
    DeviceNotFound(Uuid),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from tracking API: {0}")]
    Decode(String),
}

/// Remote tracking backend operations.
#[async_trait::async_trait]
pub trait TrackingApi: Send + Sync {
    /// Create a device record. The backend assigns the identifier.
    async fn register_device(&self, new: NewDevice) -> Result<TrackedDevice, ApiError>;

    /// Fetch a device with its zones, contacts and settings.
    async fn device(&self, device_id: Uuid) -> Result<TrackedDevice, ApiError>;

    /// All devices registered to a student.
    async fn student_devices(&self, student_id: i64) -> Result<Vec<TrackedDevice>, ApiError>;

    /// All devices a parent may monitor.
    async fn parent_devices(&self, parent_id: i64) -> Result<Vec<TrackedDevice>, ApiError>;

    /// PATCH mutable device status fields.
    async fn update_device_status(
        &self,
        device_id: Uuid,
        update: DeviceStatusUpdate,
    ) -> Result<(), ApiError>;

    /// Persist a position sample.
    async fn push_location(&self, device_id: Uuid, fix: &PositionFix) -> Result<(), ApiError>;

    /// The most recently persisted position sample, if any.
    async fn last_location(&self, device_id: Uuid) -> Result<Option<PositionFix>, ApiError>;

    /// Attach a safe zone to a device.
    async fn add_safe_zone(&self, device_id: Uuid, zone: NewSafeZone)
        -> Result<SafeZone, ApiError>;

    /// Partially update tracking settings.
    async fn update_settings(
        &self,
        device_id: Uuid,
        patch: TrackingSettingsPatch,
    ) -> Result<(), ApiError>;

    /// Stored zone membership state. Devices never seen in a zone read as
    /// outside.
    async fn zone_status(&self, device_id: Uuid, zone_id: Uuid) -> Result<bool, ApiError>;

    /// Persist zone membership state.
    async fn set_zone_status(
        &self,
        device_id: Uuid,
        zone_id: Uuid,
        is_in_zone: bool,
    ) -> Result<(), ApiError>;

    /// Record an alert.
    async fn create_alert(&self, alert: NewAlert) -> Result<(), ApiError>;

    /// Dispatch an emergency notification to a single contact.
    async fn send_emergency_alert(&self, request: EmergencyAlertRequest) -> Result<(), ApiError>;

    /// Most recent alerts for a device, newest first.
    async fn device_alerts(
        &self,
        device_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LocationAlert>, ApiError>;
}

#[derive(Default)]
struct MemoryState {
    devices: HashMap<Uuid, TrackedDevice>,
    parent_links: HashMap<i64, Vec<Uuid>>,
    zone_status: HashMap<(Uuid, Uuid), bool>,
    last_locations: HashMap<Uuid, PositionFix>,
    alerts: Vec<LocationAlert>,
    emergency_dispatches: Vec<EmergencyAlertRequest>,
    failing_contacts: Vec<Uuid>,
}

/// In-memory tracking backend for development and testing.
///
/// Holds the same state shape the real backend owns, behind a single mutex.
#[derive(Default)]
pub struct InMemoryTrackingApi {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl InMemoryTrackingApi {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a total backend outage: every call returns a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Make emergency dispatch fail for one contact.
    pub async fn fail_emergency_contact(&self, contact_id: Uuid) {
        self.state.lock().await.failing_contacts.push(contact_id);
    }

    /// Seed a fully-formed device record, bypassing registration.
    pub async fn seed_device(&self, device: TrackedDevice) {
        self.state.lock().await.devices.insert(device.id, device);
    }

    /// Grant a parent visibility of a device.
    pub async fn link_parent(&self, parent_id: i64, device_id: Uuid) {
        self.state
            .lock()
            .await
            .parent_links
            .entry(parent_id)
            .or_default()
            .push(device_id);
    }

    /// All alerts recorded so far, oldest first.
    pub async fn recorded_alerts(&self) -> Vec<LocationAlert> {
        self.state.lock().await.alerts.clone()
    }

    /// All emergency dispatches attempted so far.
    pub async fn emergency_dispatches(&self) -> Vec<EmergencyAlertRequest> {
        self.state.lock().await.emergency_dispatches.clone()
    }

    /// Current settings for a device, for assertions.
    pub async fn settings(&self, device_id: Uuid) -> Option<crate::models::TrackingSettings> {
        self.state
            .lock()
            .await
            .devices
            .get(&device_id)
            .map(|d| d.tracking_settings.clone())
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::Relaxed) {
            Err(ApiError::Transport("simulated backend outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl TrackingApi for InMemoryTrackingApi {
    async fn register_device(&self, new: NewDevice) -> Result<TrackedDevice, ApiError> {
        self.check_online()?;
        let device = new.into_device(Uuid::new_v4(), chrono::Utc::now());
        let mut state = self.state.lock().await;
        state.devices.insert(device.id, device.clone());
        tracing::debug!(device_id = %device.id, "Registered device in memory backend");
        Ok(device)
    }

    async fn device(&self, device_id: Uuid) -> Result<TrackedDevice, ApiError> {
        self.check_online()?;
        self.state
            .lock()
            .await
            .devices
            .get(&device_id)
            .cloned()
            .ok_or(ApiError::DeviceNotFound(device_id))
    }

    async fn student_devices(&self, student_id: i64) -> Result<Vec<TrackedDevice>, ApiError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .await
            .devices
            .values()
            .filter(|d| d.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn parent_devices(&self, parent_id: i64) -> Result<Vec<TrackedDevice>, ApiError> {
        self.check_online()?;
        let state = self.state.lock().await;
        let ids = state.parent_links.get(&parent_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.devices.get(id).cloned())
            .collect())
    }

    async fn update_device_status(
        &self,
        device_id: Uuid,
        update: DeviceStatusUpdate,
    ) -> Result<(), ApiError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let device = state
            .devices
            .get_mut(&device_id)
            .ok_or(ApiError::DeviceNotFound(device_id))?;
        if let Some(active) = update.is_active {
            device.is_active = active;
        }
        if let Some(seen) = update.last_seen {
            device.last_seen = seen;
        }
        if let Some(level) = update.battery_level {
            device.battery_level = Some(level);
        }
        Ok(())
    }

    async fn push_location(&self, device_id: Uuid, fix: &PositionFix) -> Result<(), ApiError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let device = state
            .devices
            .get_mut(&device_id)
            .ok_or(ApiError::DeviceNotFound(device_id))?;
        device.current_location = Some(fix.clone());
        device.last_seen = fix.timestamp;
        state.last_locations.insert(device_id, fix.clone());
        Ok(())
    }

    async fn last_location(&self, device_id: Uuid) -> Result<Option<PositionFix>, ApiError> {
        self.check_online()?;
        Ok(self.state.lock().await.last_locations.get(&device_id).cloned())
    }

    async fn add_safe_zone(
        &self,
        device_id: Uuid,
        zone: NewSafeZone,
    ) -> Result<SafeZone, ApiError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let device = state
            .devices
            .get_mut(&device_id)
            .ok_or(ApiError::DeviceNotFound(device_id))?;
        let zone = zone.into_zone(Uuid::new_v4());
        device.safe_zones.push(zone.clone());
        Ok(zone)
    }

    async fn update_settings(
        &self,
        device_id: Uuid,
        patch: TrackingSettingsPatch,
    ) -> Result<(), ApiError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let device = state
            .devices
            .get_mut(&device_id)
            .ok_or(ApiError::DeviceNotFound(device_id))?;
        patch.apply_to(&mut device.tracking_settings);
        Ok(())
    }

    async fn zone_status(&self, device_id: Uuid, zone_id: Uuid) -> Result<bool, ApiError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .await
            .zone_status
            .get(&(device_id, zone_id))
            .copied()
            .unwrap_or(false))
    }

    async fn set_zone_status(
        &self,
        device_id: Uuid,
        zone_id: Uuid,
        is_in_zone: bool,
    ) -> Result<(), ApiError> {
        self.check_online()?;
        self.state
            .lock()
            .await
            .zone_status
            .insert((device_id, zone_id), is_in_zone);
        Ok(())
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<(), ApiError> {
        self.check_online()?;
        let stored = alert.into_alert(Uuid::new_v4());
        self.state.lock().await.alerts.push(stored);
        Ok(())
    }

    async fn send_emergency_alert(&self, request: EmergencyAlertRequest) -> Result<(), ApiError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        if state.failing_contacts.contains(&request.contact_id) {
            tracing::warn!(
                contact_id = %request.contact_id,
                "Memory backend simulating emergency dispatch failure"
            );
            return Err(ApiError::Status {
                status: 502,
                message: "notification gateway unavailable".to_string(),
            });
        }
        state.emergency_dispatches.push(request);
        Ok(())
    }

    async fn device_alerts(
        &self,
        device_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LocationAlert>, ApiError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .await
            .alerts
            .iter()
            .rev()
            .filter(|a| a.device_id == device_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
