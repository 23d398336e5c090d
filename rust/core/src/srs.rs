// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial references and Earth-centered (ECEF) conversion
//!
//! Only the reference frames the extrusion stage needs are modelled. WGS84
//! geographic coordinates are `(lon, lat, height)` in degrees and metres;
//! spherical mercator (EPSG:3857) is in metres; geocentric points are already
//! ECEF. `Projected` is an opaque planar frame without an ECEF mapping.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (metres)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Coordinate reference of feature geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialReference {
    /// WGS84 longitude/latitude in degrees, height in metres
    #[default]
    Geographic,
    /// EPSG:3857 metres on the WGS84 semi-major sphere
    SphericalMercator,
    /// Earth-centered, Earth-fixed metres
    Geocentric,
    /// Planar coordinates with no known geodetic mapping
    Projected,
}

impl SpatialReference {
    #[inline]
    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Geographic)
    }

    #[inline]
    pub fn is_geocentric(&self) -> bool {
        matches!(self, Self::Geocentric)
    }

    /// Whether points in this frame can be placed on the ellipsoid
    #[inline]
    pub fn can_convert_to_ecef(&self) -> bool {
        !matches!(self, Self::Projected)
    }

    /// Convert a native point to geodetic `(lon_deg, lat_deg, height)`
    pub fn to_geodetic(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        match self {
            Self::Geographic => Some(*point),
            Self::SphericalMercator => {
                let lon = (point.x / WGS84_A).to_degrees();
                let lat = (2.0 * (point.y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Some(Point3::new(lon, lat, point.z))
            }
            Self::Geocentric => Some(ecef_to_geodetic(point)),
            Self::Projected => None,
        }
    }

    /// Convert a native point to ECEF; `Projected` points pass through unchanged
    pub fn to_ecef(&self, point: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Geocentric | Self::Projected => *point,
            _ => match self.to_geodetic(point) {
                Some(g) => geodetic_to_ecef(g.x, g.y, g.z),
                None => *point,
            },
        }
    }

    /// Local east-north-up frame anchored at a native point, mapping local
    /// coordinates to ECEF. `None` when the frame has no geodetic mapping.
    pub fn local_to_world_at(&self, point: &Point3<f64>) -> Option<Matrix4<f64>> {
        let g = self.to_geodetic(point)?;
        let origin = geodetic_to_ecef(g.x, g.y, g.z);
        Some(enu_to_ecef_frame(g.x, g.y, &origin))
    }
}

/// Geodetic (degrees, metres) to ECEF on the WGS84 ellipsoid
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, height: f64) -> Point3<f64> {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // Prime vertical radius of curvature
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Point3::new(
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height) * sin_lat,
    )
}

/// ECEF to geodetic `(lon_deg, lat_deg, height)` using Bowring's method
pub fn ecef_to_geodetic(ecef: &Point3<f64>) -> Point3<f64> {
    let b = WGS84_A * (1.0 - WGS84_F);
    let ep2 = (WGS84_A * WGS84_A - b * b) / (b * b);
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();

    if p < 1e-9 {
        // On the polar axis
        let lat = if ecef.z >= 0.0 { 90.0 } else { -90.0 };
        return Point3::new(0.0, lat, ecef.z.abs() - b);
    }

    let theta = (ecef.z * WGS84_A).atan2(p * b);
    let (sin_t, cos_t) = theta.sin_cos();
    let lat = (ecef.z + ep2 * b * sin_t.powi(3)).atan2(p - WGS84_E2 * WGS84_A * cos_t.powi(3));
    let lon = ecef.y.atan2(ecef.x);
    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let height = p / lat.cos() - n;

    Point3::new(lon.to_degrees(), lat.to_degrees(), height)
}

/// East-north-up basis at a geodetic location, translated to `origin`
#[rustfmt::skip]
pub fn enu_to_ecef_frame(lon_deg: f64, lat_deg: f64, origin: &Point3<f64>) -> Matrix4<f64> {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    let east = Vector3::new(-sin_lon, cos_lon, 0.0);
    let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
    let up = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

    // Columns are the world-space directions of the local axes
    Matrix4::new(
        east.x, north.x, up.x, origin.x,
        east.y, north.y, up.y, origin.y,
        east.z, north.z, up.z, origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let p = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert_relative_eq!(p.x, WGS84_A, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_height_extends_along_normal() {
        let base = geodetic_to_ecef(0.0, 0.0, 0.0);
        let raised = geodetic_to_ecef(0.0, 0.0, 100.0);
        assert_relative_eq!(raised.x - base.x, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_geodetic_round_trip() {
        let ecef = geodetic_to_ecef(8.54, 47.37, 412.0);
        let g = ecef_to_geodetic(&ecef);
        assert_relative_eq!(g.x, 8.54, epsilon = 1e-9);
        assert_relative_eq!(g.y, 47.37, epsilon = 1e-7);
        assert_relative_eq!(g.z, 412.0, epsilon = 1e-2);
    }

    #[test]
    fn test_spherical_mercator_origin() {
        let g = SpatialReference::SphericalMercator
            .to_geodetic(&Point3::new(0.0, 0.0, 5.0))
            .unwrap();
        assert_relative_eq!(g.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(g.y, 0.0, epsilon = 1e-12);
        assert_eq!(g.z, 5.0);
    }

    #[test]
    fn test_projected_passes_through() {
        let p = Point3::new(500_000.0, 5_000_000.0, 10.0);
        assert_eq!(SpatialReference::Projected.to_ecef(&p), p);
        assert!(SpatialReference::Projected.local_to_world_at(&p).is_none());
    }

    #[test]
    fn test_enu_frame_up_axis() {
        let origin = geodetic_to_ecef(0.0, 0.0, 0.0);
        let frame = enu_to_ecef_frame(0.0, 0.0, &origin);
        // Local +Z maps to the outward radial direction at (0, 0)
        let up = frame.transform_point(&Point3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(up.x, WGS84_A + 10.0, epsilon = 1e-6);
    }
}
