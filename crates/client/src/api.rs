//! REST client for the tracking backend.
//!
//! Implements [`TrackingApi`] over the `/api/tracking` endpoint family. All
//! requests share one `reqwest::Client` with a configured timeout; there is
//! no application-level retry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::{
    DeviceStatusUpdate, EmergencyAlertRequest, LocationAlert, NewAlert, NewDevice, NewSafeZone,
    PositionFix, SafeZone, TrackedDevice, TrackingSettingsPatch,
};
use domain::services::{ApiError, TrackingApi};

/// Tracking backend connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingApiConfig {
    /// Backend origin, e.g. `https://app.edutrack.example`.
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Wire body for zone membership state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneStatusBody {
    is_in_zone: bool,
}

/// HTTP implementation of the tracking backend seam.
pub struct TrackingApiClient {
    client: reqwest::Client,
    base: String,
}

impl TrackingApiClient {
    /// Build a client from connection settings.
    pub fn new(config: &TrackingApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base: format!("{}/api/tracking", config.base_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Convert a non-success response into a status error.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::check(response).await
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::check(response).await
    }

    async fn patch_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::check(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TrackingApi for TrackingApiClient {
    async fn register_device(&self, new: NewDevice) -> Result<TrackedDevice, ApiError> {
        let response = self.post_json("/devices", &new).await?;
        Self::decode(response).await
    }

    async fn device(&self, device_id: Uuid) -> Result<TrackedDevice, ApiError> {
        match self.get(&format!("/devices/{device_id}")).await {
            Ok(response) => Self::decode(response).await,
            Err(ApiError::Status { status: 404, .. }) => Err(ApiError::DeviceNotFound(device_id)),
            Err(e) => Err(e),
        }
    }

    async fn student_devices(&self, student_id: i64) -> Result<Vec<TrackedDevice>, ApiError> {
        let response = self.get(&format!("/students/{student_id}/devices")).await?;
        Self::decode(response).await
    }

    async fn parent_devices(&self, parent_id: i64) -> Result<Vec<TrackedDevice>, ApiError> {
        let response = self.get(&format!("/parents/{parent_id}/devices")).await?;
        Self::decode(response).await
    }

    async fn update_device_status(
        &self,
        device_id: Uuid,
        update: DeviceStatusUpdate,
    ) -> Result<(), ApiError> {
        self.patch_json(&format!("/devices/{device_id}"), &update)
            .await?;
        Ok(())
    }

    async fn push_location(&self, device_id: Uuid, fix: &PositionFix) -> Result<(), ApiError> {
        self.post_json(&format!("/devices/{device_id}/location"), fix)
            .await?;
        Ok(())
    }

    async fn last_location(&self, device_id: Uuid) -> Result<Option<PositionFix>, ApiError> {
        match self.get(&format!("/devices/{device_id}/last-location")).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn add_safe_zone(
        &self,
        device_id: Uuid,
        zone: NewSafeZone,
    ) -> Result<SafeZone, ApiError> {
        let response = self
            .post_json(&format!("/devices/{device_id}/safe-zones"), &zone)
            .await?;
        Self::decode(response).await
    }

    async fn update_settings(
        &self,
        device_id: Uuid,
        patch: TrackingSettingsPatch,
    ) -> Result<(), ApiError> {
        self.patch_json(&format!("/devices/{device_id}/settings"), &patch)
            .await?;
        Ok(())
    }

    async fn zone_status(&self, device_id: Uuid, zone_id: Uuid) -> Result<bool, ApiError> {
        let response = self
            .get(&format!("/devices/{device_id}/zone-status/{zone_id}"))
            .await?;
        let body: ZoneStatusBody = Self::decode(response).await?;
        Ok(body.is_in_zone)
    }

    async fn set_zone_status(
        &self,
        device_id: Uuid,
        zone_id: Uuid,
        is_in_zone: bool,
    ) -> Result<(), ApiError> {
        self.post_json(
            &format!("/devices/{device_id}/zone-status/{zone_id}"),
            &ZoneStatusBody { is_in_zone },
        )
        .await?;
        Ok(())
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<(), ApiError> {
        self.post_json("/alerts", &alert).await?;
        Ok(())
    }

    async fn send_emergency_alert(&self, request: EmergencyAlertRequest) -> Result<(), ApiError> {
        self.post_json("/emergency-alert", &request).await?;
        Ok(())
    }

    async fn device_alerts(
        &self,
        device_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LocationAlert>, ApiError> {
        let response = self
            .get(&format!("/devices/{device_id}/alerts?limit={limit}"))
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> TrackingApiConfig {
        TrackingApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_config_default_timeout() {
        let cfg: TrackingApiConfig =
            serde_json::from_str(r#"{"base_url": "https://app.edutrack.example"}"#).unwrap();
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = TrackingApiClient::new(&config("https://app.edutrack.example/")).unwrap();
        assert_eq!(
            client.url("/devices"),
            "https://app.edutrack.example/api/tracking/devices"
        );
    }

    #[test]
    fn test_url_with_path_parameters() {
        let client = TrackingApiClient::new(&config("http://localhost:5000")).unwrap();
        let device_id = Uuid::nil();
        assert_eq!(
            client.url(&format!("/devices/{device_id}/last-location")),
            "http://localhost:5000/api/tracking/devices/00000000-0000-0000-0000-000000000000/last-location"
        );
    }

    #[test]
    fn test_zone_status_body_wire_format() {
        let body = ZoneStatusBody { is_in_zone: true };
        assert_eq!(serde_json::to_string(&body).unwrap(), "{\"isInZone\":true}");

        let parsed: ZoneStatusBody = serde_json::from_str("{\"isInZone\":false}").unwrap();
        assert!(!parsed.is_in_zone);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Reserved TEST-NET-1 address; nothing listens there.
        let client = TrackingApiClient::new(&TrackingApiConfig {
            base_url: "http://192.0.2.1:9".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let err = client.device(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
