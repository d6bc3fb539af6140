//! HTTP clients for the remote services Edutrack talks to:
//! the tracking backend REST API and the Nominatim reverse-geocoding
//! service.

pub mod api;
pub mod geocode;

pub use api::{TrackingApiClient, TrackingApiConfig};
pub use geocode::{GeocoderConfig, ReverseGeocoder};
