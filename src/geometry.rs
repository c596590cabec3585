//! Spherical geometry helpers
//!
//! Conversions between latitude/longitude and unit-sphere positions, the
//! stereographic projection used to triangulate the sphere, and a few
//! measurements (great-circle distance, triangle centroids).
//!
//! Degenerate inputs (zero vectors, out-of-range `asin` arguments, points at
//! the projection pole) are clamped or mapped to zero instead of producing NaN.

use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// A point on the sphere in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 (south) to 90 (north)
    pub lat: f64,
    /// Longitude in degrees, -180 to 180
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Position on the unit sphere.
    pub fn to_xyz(self) -> DVec3 {
        lat_lon_to_xyz(self)
    }
}

/// Convert latitude/longitude (degrees) to a unit vector.
pub fn lat_lon_to_xyz(p: LatLon) -> DVec3 {
    let lat = p.lat.to_radians();
    let lon = p.lon.to_radians();
    let r = lat.cos();
    DVec3::new(r * lon.cos(), r * lon.sin(), lat.sin())
}

/// Convert a vector to latitude/longitude. The vector does not need to be
/// normalized; a zero vector maps to (0, 0).
pub fn xyz_to_lat_lon(v: DVec3) -> LatLon {
    let v = v.normalize_or_zero();
    if v == DVec3::ZERO {
        return LatLon::default();
    }
    let lat = v.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = v.y.atan2(v.x).to_degrees();
    LatLon { lat, lon }
}

/// Wrap a longitude into [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Great-circle distance between two unit vectors, in radians.
///
/// Uses atan2 of the cross and dot products, which stays accurate for both
/// nearly identical and nearly antipodal points.
pub fn great_circle_distance(a: DVec3, b: DVec3) -> f64 {
    a.cross(b).length().atan2(a.dot(b))
}

/// Centroid of a spherical triangle, pushed back onto the unit sphere.
pub fn spherical_centroid(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    ((a + b + c) / 3.0).normalize_or_zero()
}

/// Rotation that carries `pole` onto the +Z axis.
pub fn rotation_to_north(pole: DVec3) -> DQuat {
    let pole = pole.normalize_or_zero();
    if pole == DVec3::ZERO {
        return DQuat::IDENTITY;
    }
    DQuat::from_rotation_arc(pole, DVec3::Z)
}

/// Smallest `1 - z` accepted by the projection. Anything closer to the pole
/// would be sent to (numerically) infinity.
pub const PROJECTION_GUARD: f64 = 1e-12;

/// Stereographic projection from the north pole (0, 0, 1) onto the z = 0 plane.
///
/// Returns `None` for the pole itself, where the projection is undefined.
pub fn stereographic_project(v: DVec3) -> Option<DVec2> {
    let denom = 1.0 - v.z;
    if denom <= PROJECTION_GUARD {
        return None;
    }
    Some(DVec2::new(v.x / denom, v.y / denom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_lat_lon() {
        let p = LatLon::new(37.5, -122.25);
        let back = xyz_to_lat_lon(p.to_xyz());
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lon - p.lon).abs() < 1e-9);
    }

    #[test]
    fn test_poles_are_unit_z() {
        let north = LatLon::new(90.0, 45.0).to_xyz();
        let south = LatLon::new(-90.0, -10.0).to_xyz();
        assert!((north - DVec3::Z).length() < 1e-12);
        assert!((south + DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_zero_vector_is_not_nan() {
        let p = xyz_to_lat_lon(DVec3::ZERO);
        assert_eq!(p, LatLon::default());
        assert_eq!(spherical_centroid(DVec3::X, -DVec3::X, DVec3::ZERO), DVec3::ZERO);
    }

    #[test]
    fn test_great_circle_distance() {
        let d = great_circle_distance(DVec3::X, DVec3::Y);
        assert!((d - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let d = great_circle_distance(DVec3::X, -DVec3::X);
        assert!((d - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_projection_rejects_pole() {
        assert!(stereographic_project(DVec3::Z).is_none());
        let p = stereographic_project(-DVec3::Z).unwrap();
        assert!(p.length() < 1e-12);
    }

    #[test]
    fn test_rotation_to_north() {
        let pole = LatLon::new(10.0, 70.0).to_xyz();
        let q = rotation_to_north(pole);
        assert!((q * pole - DVec3::Z).length() < 1e-9);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(45.0), 45.0);
    }
}
