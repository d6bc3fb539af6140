//! Emergency contact domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A person notified when a device escalates to emergency mode.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 5, max = 20, message = "Phone must be 5-20 characters"))]
    pub phone: String,

    #[validate(length(min = 1, max = 50, message = "Relationship must be 1-50 characters"))]
    pub relationship: String,

    /// Dispatch ordering; lower values are contacted first in UIs.
    pub priority: i32,

    /// Whether this contact may view live device positions.
    pub can_track: bool,
}
