//! Reverse geocoding via OpenStreetMap Nominatim.
//!
//! Lookups are best effort: any failure (disabled service, rate limit,
//! network, non-2xx, parse) degrades to the raw coordinates rendered as the
//! address, never an error. Nominatim's usage policy caps request rates, so
//! a token bucket guards the outbound calls.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use domain::models::PositionFix;

/// Estimated accuracy of a successful reverse-geocode result, in metres.
const GEOCODED_ACCURACY_M: f64 = 100.0;

/// Accuracy reported for the coordinate fallback, in metres.
const FALLBACK_ACCURACY_M: f64 = 1000.0;

/// Reverse-geocoding service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    /// Service origin.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Max requests per minute to the external service.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Whether lookups are attempted at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_rate_limit() -> u32 {
    30
}
fn default_enabled() -> bool {
    true
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
            rate_limit_per_minute: default_rate_limit(),
            enabled: default_enabled(),
        }
    }
}

/// Internal lookup failures; callers only ever see the fallback.
#[derive(Debug, Error)]
enum GeocodeError {
    #[error("Reverse geocoding is disabled")]
    Disabled,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoding service returned status {0}")]
    Status(u16),

    #[error("Invalid response from geocoding service: {0}")]
    Decode(String),
}

/// Nominatim reverse response structure.
#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Simple token bucket rate limiter.
struct RateLimiter {
    tokens: AtomicU32,
    max_tokens: u32,
    last_refill: AtomicU64,
}

impl RateLimiter {
    fn new(requests_per_minute: u32) -> Self {
        Self {
            tokens: AtomicU32::new(requests_per_minute),
            max_tokens: requests_per_minute,
            last_refill: AtomicU64::new(now_millis()),
        }
    }

    /// Try to acquire a token. Returns true if allowed.
    fn try_acquire(&self) -> bool {
        let now = now_millis();
        let last_refill = self.last_refill.load(Ordering::Relaxed);

        // Refill tokens every minute.
        if now.saturating_sub(last_refill) >= 60_000 {
            self.tokens.store(self.max_tokens, Ordering::Relaxed);
            self.last_refill.store(now, Ordering::Relaxed);
        }

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }
            if self
                .tokens
                .compare_exchange_weak(current, current - 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Best-effort reverse geocoder.
pub struct ReverseGeocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
    rate_limiter: RateLimiter,
}

impl ReverseGeocoder {
    /// Build a geocoder from service settings.
    pub fn new(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute);
        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Resolve coordinates to an address, degrading to the coordinates
    /// themselves on any failure.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> PositionFix {
        match self.lookup(latitude, longitude).await {
            Ok(fix) => fix,
            Err(e) => {
                warn!(
                    latitude,
                    longitude,
                    error = %e,
                    "Reverse geocoding failed, falling back to raw coordinates"
                );
                Self::fallback(latitude, longitude)
            }
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<PositionFix, GeocodeError> {
        if !self.config.enabled {
            return Err(GeocodeError::Disabled);
        }
        if !self.rate_limiter.try_acquire() {
            return Err(GeocodeError::RateLimited);
        }

        let url = format!(
            "{}/reverse?format=json&lat={latitude}&lon={longitude}&zoom=10&addressdetails=1",
            self.config.url.trim_end_matches('/'),
        );
        debug!(url = %url, "Calling Nominatim reverse geocoding");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;

        let address = body.address.unwrap_or_default();
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default();

        Ok(PositionFix {
            latitude,
            longitude,
            accuracy: GEOCODED_ACCURACY_M,
            timestamp: Utc::now(),
            address: Some(body.display_name.unwrap_or_default()),
            city: Some(city),
            country: Some(address.country.unwrap_or_default()),
        })
    }

    /// Coordinate-only result used when the service cannot be reached.
    fn fallback(latitude: f64, longitude: f64) -> PositionFix {
        PositionFix {
            latitude,
            longitude,
            accuracy: FALLBACK_ACCURACY_M,
            timestamp: Utc::now(),
            address: Some(format!("{latitude:.4}, {longitude:.4}")),
            city: Some("Unknown".to_string()),
            country: Some("Unknown".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> GeocoderConfig {
        GeocoderConfig {
            enabled: false,
            ..GeocoderConfig::default()
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = GeocoderConfig::default();
        assert_eq!(config.url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.enabled);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: GeocoderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.rate_limit_per_minute, 30);
    }

    #[test]
    fn test_disabled_geocoder_falls_back() {
        let geocoder = ReverseGeocoder::new(disabled_config()).unwrap();
        let fix = tokio_test::block_on(geocoder.reverse_geocode(3.8480, 11.5021));
        assert_eq!(fix.city.as_deref(), Some("Unknown"));
        assert_eq!(fix.country.as_deref(), Some("Unknown"));
        assert_eq!(fix.accuracy, 1000.0);
        assert_eq!(fix.address.as_deref(), Some("3.8480, 11.5021"));
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let geocoder = ReverseGeocoder::new(GeocoderConfig {
            url: "http://192.0.2.1:9".to_string(),
            timeout_ms: 500,
            ..GeocoderConfig::default()
        })
        .unwrap();
        let fix = geocoder.reverse_geocode(6.5244, 3.3792).await;
        assert_eq!(fix.city.as_deref(), Some("Unknown"));
        assert_eq!(fix.accuracy, 1000.0);
        // Coordinates survive the fallback untouched.
        assert_eq!(fix.latitude, 6.5244);
        assert_eq!(fix.longitude, 3.3792);
    }

    #[tokio::test]
    async fn test_rate_limited_lookup_falls_back() {
        let geocoder = ReverseGeocoder::new(GeocoderConfig {
            rate_limit_per_minute: 0,
            ..GeocoderConfig::default()
        })
        .unwrap();
        let fix = geocoder.reverse_geocode(14.7167, -17.4677).await;
        assert_eq!(fix.city.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_rate_limiter_exhausts() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_nominatim_response_parsing() {
        let json = r#"{
            "display_name": "Yaoundé, Mfoundi, Centre, Cameroon",
            "address": {"city": "Yaoundé", "country": "Cameroon"}
        }"#;
        let parsed: NominatimResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.display_name.as_deref(), Some("Yaoundé, Mfoundi, Centre, Cameroon"));
        assert_eq!(parsed.address.unwrap().city.as_deref(), Some("Yaoundé"));
    }

    #[test]
    fn test_nominatim_town_fallback() {
        let json = r#"{"address": {"town": "Mbalmayo", "country": "Cameroon"}}"#;
        let parsed: NominatimResponse = serde_json::from_str(json).unwrap();
        let address = parsed.address.unwrap();
        let city = address.city.or(address.town).or(address.village).unwrap();
        assert_eq!(city, "Mbalmayo");
    }
}
