// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World/local frame for emitted vertices
//!
//! Extruded vertices are stored as f32, so they are expressed relative to a
//! frame anchored near the data. In geocentric mode the frame is the local
//! east-north-up tangent frame at the extent centroid and every point is
//! converted to ECEF first; otherwise the frame is a plain translation to the
//! centroid, applied only when the coordinates are large enough to lose
//! precision in f32.

use extrude_lite_core::{GeoExtent, SpatialReference};
use nalgebra::{Matrix4, Point3};

/// Converts native feature coordinates into the local output frame
#[derive(Debug, Clone, PartialEq)]
pub struct Localizer {
    srs: SpatialReference,
    make_ecef: bool,
    world_to_local: Matrix4<f64>,
    local_to_world: Matrix4<f64>,
}

impl Localizer {
    /// Pass-through localizer
    pub fn identity(srs: SpatialReference) -> Self {
        Self {
            srs,
            make_ecef: false,
            world_to_local: Matrix4::identity(),
            local_to_world: Matrix4::identity(),
        }
    }

    /// Build the frame for `extent`
    ///
    /// `geocentric` requests ECEF output; it is ignored when the extent's
    /// spatial reference has no geodetic mapping.
    pub fn new(extent: &GeoExtent, geocentric: bool) -> Self {
        let srs = extent.srs;
        if !extent.is_valid() {
            return Self::identity(srs);
        }

        let centroid = extent.centroid();

        if geocentric && srs.can_convert_to_ecef() {
            if let Some(local_to_world) = srs.local_to_world_at(&centroid) {
                return Self::from_local_to_world(srs, true, local_to_world);
            }
        }

        if extent.bounds.has_large_coordinates() {
            let local_to_world = Matrix4::new_translation(&centroid.coords);
            return Self::from_local_to_world(srs, false, local_to_world);
        }

        Self::identity(srs)
    }

    fn from_local_to_world(
        srs: SpatialReference,
        make_ecef: bool,
        local_to_world: Matrix4<f64>,
    ) -> Self {
        match local_to_world.try_inverse() {
            Some(world_to_local) => Self {
                srs,
                make_ecef,
                world_to_local,
                local_to_world,
            },
            None => {
                tracing::warn!(srs = ?srs, "Singular localization frame; using identity");
                Self::identity(srs)
            }
        }
    }

    /// Whether points are converted to ECEF before localizing
    #[inline]
    pub fn is_geocentric(&self) -> bool {
        self.make_ecef
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        !self.make_ecef && self.local_to_world == Matrix4::identity()
    }

    #[inline]
    pub fn world_to_local(&self) -> &Matrix4<f64> {
        &self.world_to_local
    }

    /// Transform that places local output back in the world
    #[inline]
    pub fn local_to_world(&self) -> &Matrix4<f64> {
        &self.local_to_world
    }

    /// Native point to local frame
    #[inline]
    pub fn to_local(&self, point: &Point3<f64>) -> Point3<f64> {
        let world = if self.make_ecef {
            self.srs.to_ecef(point)
        } else {
            *point
        };
        self.world_to_local.transform_point(&world)
    }

    /// Local point back to world (ECEF in geocentric mode)
    #[inline]
    pub fn to_world(&self, point: &Point3<f64>) -> Point3<f64> {
        self.local_to_world.transform_point(point)
    }
}
