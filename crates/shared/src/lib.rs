//! Shared utilities and common types for the Edutrack workspace.
//!
//! This crate provides functionality used across all other crates:
//! - Geospatial math (great-circle distance, zone containment)
//! - Common validation logic for coordinates, speeds and clock strings

pub mod geo;
pub mod validation;
