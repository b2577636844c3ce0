//! Geospatial primitives used by breach detection.
//!
//! Coordinates are WGS84 decimal degrees. Distances are great-circle
//! distances on a spherical Earth, which is well inside the accuracy of a
//! handset GPS fix at the scale of a guarded post.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Validation errors raised by [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateValidationError {
    /// Latitude was not finite or outside `[-90, 90]`.
    #[error("latitude is out of range: {value}")]
    InvalidLatitude {
        /// Rejected value.
        value: f64,
    },
    /// Longitude was not finite or outside `[-180, 180]`.
    #[error("longitude is out of range: {value}")]
    InvalidLongitude {
        /// Rejected value.
        value: f64,
    },
}

/// A validated latitude/longitude pair.
///
/// # Examples
/// ```
/// use guardpost_backend::domain::Coordinate;
///
/// let post = Coordinate::new(12.0, 77.0)?;
/// assert_eq!(post.latitude(), 12.0);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok::<(), guardpost_backend::domain::CoordinateValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateValidationError::InvalidLatitude { value: latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateValidationError::InvalidLongitude { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine great-circle distance between two points, in meters.
///
/// # Examples
/// ```
/// use guardpost_backend::domain::distance_meters;
///
/// let d = distance_meters(12.000, 77.000, 12.001, 77.000);
/// assert!((d - 111.19).abs() < 1.0);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let half_chord = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push the chord marginally past 1 for antipodal points.
    let angular_distance = 2.0 * half_chord.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * angular_distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(12.0, 77.0)]
    #[case(-33.8688, 151.2093)]
    #[case(89.9, -179.9)]
    fn identical_points_are_zero_meters_apart(#[case] lat: f64, #[case] lon: f64) {
        assert_eq!(distance_meters(lat, lon, lat, lon), 0.0);
    }

    #[rstest]
    #[case((12.0, 77.0), (12.001, 77.0))]
    #[case((51.5007, -0.1246), (51.5055, -0.0754))]
    #[case((-1.0, 179.9), (1.0, -179.9))]
    fn distance_is_symmetric(#[case] a: (f64, f64), #[case] b: (f64, f64)) {
        let forward = distance_meters(a.0, a.1, b.0, b.1);
        let backward = distance_meters(b.0, b.1, a.0, a.1);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[rstest]
    // One thousandth of a degree of latitude.
    #[case((12.000, 77.000), (12.001, 77.000), 111.195)]
    // One degree of longitude at the equator.
    #[case((0.0, 0.0), (0.0, 1.0), 111_194.927)]
    // Big Ben to the Tower of London.
    #[case((51.5007, -0.1246), (51.5081, -0.0759), 3_469.69)]
    fn matches_reference_distances(
        #[case] a: (f64, f64),
        #[case] b: (f64, f64),
        #[case] expected: f64,
    ) {
        let distance = distance_meters(a.0, a.1, b.0, b.1);
        assert!(
            (distance - expected).abs() < 1.0,
            "expected {expected}, got {distance}"
        );
    }

    #[rstest]
    fn antipodal_points_do_not_produce_nan() {
        let distance = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[rstest]
    #[case(90.5, 0.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, -180.5)]
    #[case(0.0, f64::INFINITY)]
    fn coordinate_rejects_out_of_range_values(#[case] lat: f64, #[case] lon: f64) {
        assert!(Coordinate::new(lat, lon).is_err());
    }
}
