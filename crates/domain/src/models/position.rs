//! Position fix domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A point-in-time position sample for a tracked device.
///
/// Ephemeral on the client side: fixes are pushed to the tracking backend and
/// never cached locally beyond the current sampling tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Estimated accuracy radius in metres.
    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
    /// Resolved street address, when reverse geocoding has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl PositionFix {
    /// Create a bare fix with no resolved address information.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp,
            address: None,
            city: None,
            country: None,
        }
    }

    /// Great-circle distance to another fix, in kilometres.
    pub fn kilometres_to(&self, other: &PositionFix) -> f64 {
        shared::geo::haversine_distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// Great-circle distance to a coordinate pair, in metres.
    pub fn metres_to(&self, latitude: f64, longitude: f64) -> f64 {
        shared::geo::haversine_distance_m(self.latitude, self.longitude, latitude, longitude)
    }
}
