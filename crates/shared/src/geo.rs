//! Geospatial math helpers.
//!
//! Distances are great-circle (Haversine) distances computed by the `geo`
//! crate. The tracking engine works in kilometres for speeds and in metres
//! for zone radii, so both units are exposed here.

use geo::{point, HaversineDistance};

/// Default school-zone radius in kilometres (500 m).
pub const DEFAULT_SCHOOL_RADIUS_KM: f64 = 0.5;

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = point!(x: lon1, y: lat1);
    let b = point!(x: lon2, y: lat2);
    a.haversine_distance(&b) / 1000.0
}

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = point!(x: lon1, y: lat1);
    let b = point!(x: lon2, y: lat2);
    a.haversine_distance(&b)
}

/// Whether a position lies within a circular zone around a center point.
///
/// A distance exactly equal to the radius counts as inside.
pub fn is_within_school_zone(
    pos_lat: f64,
    pos_lon: f64,
    center_lat: f64,
    center_lon: f64,
    radius_km: f64,
) -> bool {
    haversine_distance_km(pos_lat, pos_lon, center_lat, center_lon) <= radius_km
}
