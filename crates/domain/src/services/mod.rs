//! Domain services for Edutrack.
//!
//! Services contain business logic that operates on domain models.

pub mod speed;
pub mod tracking_api;
pub mod zone_evaluation;

pub use speed::{evaluate_speed, speed_between_kmh, HIGH_SPEED_THRESHOLD_KMH};
pub use tracking_api::{ApiError, InMemoryTrackingApi, TrackingApi};
pub use zone_evaluation::{evaluate_zone, ZoneEvaluation, ZoneTransition};
