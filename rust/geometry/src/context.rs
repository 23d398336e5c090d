// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-call environment for the extrusion filter

use extrude_lite_core::{Bounds, Feature, GeoExtent, SpatialReference, StyleSheet};
use std::sync::Arc;

/// Where features come from and where output is going
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    /// Spatial reference of incoming feature coordinates
    pub srs: SpatialReference,
    /// Output should be Earth-centered (ECEF) rather than projected
    pub geocentric: bool,
    /// Extent anchoring the local frame; computed from the features if unset
    pub extent: Option<GeoExtent>,
    /// Style sheet for wall/roof style names and resource libraries
    pub style_sheet: Option<Arc<StyleSheet>>,
}

impl FilterContext {
    pub fn new(srs: SpatialReference) -> Self {
        Self {
            srs,
            ..Self::default()
        }
    }

    pub fn with_geocentric(mut self, geocentric: bool) -> Self {
        self.geocentric = geocentric;
        self
    }

    pub fn with_extent(mut self, extent: GeoExtent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_style_sheet(mut self, sheet: Arc<StyleSheet>) -> Self {
        self.style_sheet = Some(sheet);
        self
    }

    pub fn style_sheet(&self) -> Option<&StyleSheet> {
        self.style_sheet.as_deref()
    }

    /// The configured extent, or the bounds of `features`
    pub fn extent_for(&self, features: &[Feature]) -> GeoExtent {
        if let Some(extent) = &self.extent {
            return extent.clone();
        }
        let mut bounds = Bounds::new();
        for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
            bounds.merge(&geometry.bounds());
        }
        GeoExtent::new(self.srs, bounds)
    }
}
