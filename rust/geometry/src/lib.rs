// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrude-Lite Geometry
//!
//! Raises 2D footprints into renderable building shells: walls with
//! continuous texture coordinates, tessellated roofs and optional base caps,
//! grouped by texture into batches under a single delocalizing transform.
//! Triangulation uses earcutr and math uses nalgebra.
//!
//! ```rust,ignore
//! use extrude_lite_geometry::{ExtrudeGeometryFilter, FilterContext};
//!
//! let filter = ExtrudeGeometryFilter::new(style);
//! let group = filter.push(&features, &FilterContext::new(SpatialReference::Projected));
//! for batch in &group.batches {
//!     println!("{}: {} meshes", batch.key, batch.meshes.len());
//! }
//! ```

pub mod batch;
pub mod consolidate;
pub mod context;
pub mod error;
pub mod extrusion;
pub mod filter;
pub mod height;
pub mod localizer;
pub mod mesh;
pub mod options;
pub mod rotation;
pub mod shape;
pub mod smoothing;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use batch::{Batch, BatchAssembler, ExtrusionGroup, StateKey};
pub use consolidate::consolidate;
pub use context::FilterContext;
pub use error::{Error, Result};
pub use extrusion::{extrude_shape, ExtrudedShape, ExtrusionParams};
pub use filter::ExtrudeGeometryFilter;
pub use height::{HeightCallback, HeightResolver};
pub use localizer::Localizer;
pub use mesh::{LineLoop, Mesh};
pub use options::ExtrudeOptions;
pub use rotation::{apparent_rotation, longest_edge};
pub use shape::{Shape, ShapeKind};
pub use smoothing::smooth_with_crease;
pub use triangulation::{
    tessellate_loops, triangulate_polygon, triangulate_polygon_with_holes, Facing,
};
