//! Domain layer for the Edutrack device-tracking engine.
//!
//! This crate contains:
//! - Domain models (devices, safe zones, contacts, alerts, position fixes)
//! - Pure evaluation services (zone transitions, speed checks)
//! - The `TrackingApi` seam to the remote tracking backend

pub mod models;
pub mod services;
