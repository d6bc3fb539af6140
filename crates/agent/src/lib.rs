//! Edutrack agent: samples device positions, evaluates safe zones and
//! speeds, and escalates emergencies against the remote tracking backend.

pub mod config;
pub mod error;
pub mod logging;
pub mod position;
pub mod sampler;
pub mod tracker;

pub use error::TrackerError;
pub use tracker::{ContactDispatch, DeviceTracker, EmergencyDispatchReport};
