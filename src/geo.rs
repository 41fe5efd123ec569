//! Great-circle distance and radius filtering.
//!
//! Proximity search is a linear scan over every stand. That is fine at the
//! expected dataset size; a spatial index can replace the scan behind
//! `Repository::stands_within_radius` without touching callers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::Stand;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS-84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in [-90, 90] and longitude in [-180, 180], both finite.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// haversine_km
///
/// Great-circle distance in kilometres. Uses the `asin` form of the haversine
/// formula, which equals `R * acos(sin φ1 sin φ2 + cos φ1 cos φ2 cos Δλ)` but stays
/// exact for coincident points (distance 0) where the `acos` form loses precision.
/// The result is symmetric in its arguments.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let half_chord = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push the term a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * half_chord.clamp(0.0, 1.0).sqrt().asin()
}

/// Keeps the stands whose distance from `center` is at most `radius_km`
/// (inclusive), preserving the input order.
pub fn within_radius(stands: Vec<Stand>, center: Coordinates, radius_km: f64) -> Vec<Stand> {
    stands
        .into_iter()
        .filter(|stand| haversine_km(center, stand.coordinates()) <= radius_km)
        .collect()
}
