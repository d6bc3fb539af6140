//! Unified error type for tracking operations.

use thiserror::Error;
use uuid::Uuid;

use crate::position::PositionError;
use domain::services::ApiError;

/// Errors surfaced by [`crate::tracker::DeviceTracker`] operations.
///
/// Three observable failure categories: the device is unknown, the backend
/// could not be reached or answered badly, or the position source failed.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Device not found: {0}")]
    DeviceNotFound(Uuid),

    #[error("Tracking API error: {0}")]
    Api(ApiError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),
}

impl From<ApiError> for TrackerError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::DeviceNotFound(id) => TrackerError::DeviceNotFound(id),
            other => TrackerError::Api(other),
        }
    }
}
