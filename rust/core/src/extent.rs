// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extent bounds for localization
//!
//! Tracks the bounding box of the features handed to one extrusion pass in f64
//! precision, so the localizer can anchor its frame near the data.

use crate::srs::SpatialReference;
use nalgebra::Point3;

/// Coordinates farther than this from the origin are worth localizing (10km)
pub const LARGE_COORDINATE_THRESHOLD: f64 = 10_000.0;

/// Axis-aligned bounds in f64 precision
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
    /// Number of points added
    pub sample_count: usize,
}

impl Bounds {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            min_z: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
            max_z: f64::MIN,
            sample_count: 0,
        }
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.min_z = self.min_z.min(z);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.max_z = self.max_z.max(z);
        self.sample_count += 1;
    }

    /// Expand to include another bounds
    pub fn merge(&mut self, other: &Bounds) {
        if !other.is_valid() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        self.max_z = self.max_z.max(other.max_z);
        self.sample_count += other.sample_count;
    }

    /// Center of the bounding box
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        if !self.is_valid() {
            return Point3::origin();
        }
        Point3::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// Check if bounds contain large coordinates (>10km from origin)
    #[inline]
    pub fn has_large_coordinates(&self) -> bool {
        if !self.is_valid() {
            return false;
        }
        [
            self.min_x, self.min_y, self.min_z, self.max_x, self.max_y, self.max_z,
        ]
        .iter()
        .any(|v| v.abs() > LARGE_COORDINATE_THRESHOLD)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds tagged with the spatial reference they are expressed in
#[derive(Debug, Clone, PartialEq)]
pub struct GeoExtent {
    pub srs: SpatialReference,
    pub bounds: Bounds,
}

impl GeoExtent {
    pub fn new(srs: SpatialReference, bounds: Bounds) -> Self {
        Self { srs, bounds }
    }

    /// Center of the extent in native coordinates
    pub fn centroid(&self) -> Point3<f64> {
        self.bounds.centroid()
    }

    pub fn is_valid(&self) -> bool {
        self.bounds.is_valid()
    }
}
