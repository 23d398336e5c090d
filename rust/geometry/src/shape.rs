// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrudable shapes
//!
//! A shape is one polygon (outer ring plus holes) or one line string,
//! flattened out of a feature's geometry. Every part is extruded on its own
//! but shares the shape's elevation statistics.

use extrude_lite_core::geometry::{open_ring, Geometry};
use nalgebra::Point3;

/// Whether a shape closes back on itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Implicitly closed; walls wrap around and a roof is produced
    Polygon,
    /// Open; no closing wall and no roof
    Line,
}

/// One extrudable unit: ordered parts of 3D points
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    /// For polygons, the outer ring followed by its holes
    pub parts: Vec<Vec<Point3<f64>>>,
}

impl Shape {
    /// Polygon shape; every part is opened
    pub fn polygon(parts: Vec<Vec<Point3<f64>>>) -> Self {
        let mut shape = Self {
            kind: ShapeKind::Polygon,
            parts,
        };
        shape.parts.iter_mut().for_each(open_ring);
        shape
    }

    /// Open line shape
    pub fn line(points: Vec<Point3<f64>>) -> Self {
        Self {
            kind: ShapeKind::Line,
            parts: vec![points],
        }
    }

    /// Split a feature geometry into shapes
    ///
    /// Collections yield one shape per member. Points cannot be extruded and
    /// are dropped.
    pub fn from_geometry(geometry: &Geometry) -> Vec<Shape> {
        geometry
            .components()
            .into_iter()
            .filter_map(|component| match component {
                Geometry::Polygon(polygon) => {
                    Some(Shape::polygon(polygon.rings().map(<[_]>::to_vec).collect()))
                }
                Geometry::Ring(points) => Some(Shape::polygon(vec![points.clone()])),
                Geometry::LineString(points) => Some(Shape::line(points.clone())),
                Geometry::Point(_) | Geometry::Multi(_) => None,
            })
            .collect()
    }

    #[inline]
    pub fn is_polygon(&self) -> bool {
        self.kind == ShapeKind::Polygon
    }

    /// Outer ring (or the line itself)
    #[inline]
    pub fn outer(&self) -> &[Point3<f64>] {
        self.parts.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// All points across all parts
    pub fn points(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.parts.iter().flatten()
    }
}
