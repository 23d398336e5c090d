// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Extrude-Lite Core
//!
//! Feature and style model consumed by the extrusion stage.
//!
//! - **Geometry**: points, lines, rings, polygons with holes and collections
//! - **Features**: geometry plus attributes, with expression evaluation
//! - **Expressions**: numeric (`[levels] * 3.2`) and string (`"[name]"`) templates
//! - **Styles**: extrusion, skin and polygon symbols grouped in style sheets
//! - **Resources**: skin textures and the libraries that serve them
//! - **Spatial references**: geographic, spherical mercator and geocentric
//!   frames with WGS84 ECEF conversion
//!
//! ```rust,ignore
//! use extrude_lite_core::{StyleSheet, Feature};
//!
//! let sheet = StyleSheet::from_json(&std::fs::read_to_string("styles.json")?)?;
//! let style = sheet.style("buildings");
//! ```

pub mod error;
pub mod expression;
pub mod extent;
pub mod feature;
pub mod geometry;
pub mod resource;
pub mod srs;
pub mod style;

// Re-export nalgebra point type for convenience
pub use nalgebra::Point3;

pub use error::{Error, Result};
pub use expression::{NumericExpression, StringExpression};
pub use extent::{Bounds, GeoExtent};
pub use feature::{AttributeValue, Feature, MAX_Z_VARIABLE};
pub use geometry::{Geometry, GeometryType, Polygon};
pub use resource::{ResourceLibrary, SkinLibrary, SkinResource, TexEnvMode};
pub use srs::SpatialReference;
pub use style::{
    Color, ExtrusionSymbol, HeightReference, PolygonSymbol, SkinSymbol, Style, StyleSheet,
};
