// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion filter options

use crate::error::Result;
use extrude_lite_core::StringExpression;
use serde::{Deserialize, Serialize};

/// Tunables for [`ExtrudeGeometryFilter`](crate::ExtrudeGeometryFilter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeOptions {
    /// Merge meshes sharing render state once all shapes are extruded
    pub merge_geometry: bool,
    /// Crease angle for wall normals, in degrees
    pub wall_angle_threshold_deg: f64,
    /// Names wall and roof meshes per feature; named meshes are never merged
    pub feature_name_expr: Option<StringExpression>,
    /// Also emit downward-facing base caps
    pub generate_base: bool,
    /// Seed for picking among several matching skins; `None` seeds from entropy
    pub random_seed: Option<u64>,
    /// Extrude shapes on the rayon pool
    pub parallel: bool,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            merge_geometry: true,
            wall_angle_threshold_deg: 60.0,
            feature_name_expr: None,
            generate_base: false,
            random_seed: None,
            parallel: true,
        }
    }
}

impl ExtrudeOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Crease angle in radians
    #[inline]
    pub fn wall_crease_angle(&self) -> f64 {
        self.wall_angle_threshold_deg.to_radians()
    }

    /// Whether consolidation runs for this configuration
    #[inline]
    pub fn consolidates(&self) -> bool {
        self.merge_geometry && self.feature_name_expr.as_ref().map_or(true, |e| e.is_empty())
    }
}
