// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature geometry containers
//!
//! Points are stored in the native coordinates of the feature's spatial
//! reference: `x`/`y` are easting/northing (or lon/lat degrees) and `z` is
//! elevation.

use crate::extent::Bounds;
use nalgebra::Point3;

/// Geometry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Ring,
    Polygon,
    Multi,
}

/// Polygon with an outer boundary and optional holes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    /// Outer boundary
    pub outer: Vec<Point3<f64>>,
    /// Holes
    pub holes: Vec<Vec<Point3<f64>>>,
}

impl Polygon {
    /// Create a polygon without holes
    pub fn new(outer: Vec<Point3<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Create a polygon with holes
    pub fn with_holes(outer: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> Self {
        Self { outer, holes }
    }

    /// Add a hole
    pub fn add_hole(&mut self, hole: Vec<Point3<f64>>) {
        self.holes.push(hole);
    }

    /// Remove duplicated closing vertices from the outer boundary and every hole
    pub fn open(&mut self) {
        open_ring(&mut self.outer);
        for hole in &mut self.holes {
            open_ring(hole);
        }
    }

    /// Outer boundary followed by holes
    pub fn rings(&self) -> impl Iterator<Item = &[Point3<f64>]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Total number of points across all rings
    pub fn point_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }
}

/// Drop trailing vertices that repeat the first vertex
#[inline]
pub fn open_ring(ring: &mut Vec<Point3<f64>>) {
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
}

/// Feature geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Vec<Point3<f64>>),
    LineString(Vec<Point3<f64>>),
    Ring(Vec<Point3<f64>>),
    Polygon(Polygon),
    Multi(Vec<Geometry>),
}

impl Geometry {
    /// Geometry classification of this node
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::Ring(_) => GeometryType::Ring,
            Self::Polygon(_) => GeometryType::Polygon,
            Self::Multi(_) => GeometryType::Multi,
        }
    }

    /// Non-collection members, with nested collections flattened
    pub fn components(&self) -> Vec<&Geometry> {
        let mut out = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut Vec<&'a Geometry>) {
        match self {
            Self::Multi(members) => {
                for member in members {
                    member.collect_components(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Visit every point, including polygon holes and collection members
    pub fn for_each_point<F: FnMut(&Point3<f64>)>(&self, f: &mut F) {
        match self {
            Self::Point(points) | Self::LineString(points) | Self::Ring(points) => {
                points.iter().for_each(|p| f(p))
            }
            Self::Polygon(polygon) => {
                for ring in polygon.rings() {
                    ring.iter().for_each(|p| f(p));
                }
            }
            Self::Multi(members) => {
                for member in members {
                    member.for_each_point(f);
                }
            }
        }
    }

    /// Total number of points
    pub fn total_point_count(&self) -> usize {
        let mut count = 0;
        self.for_each_point(&mut |_| count += 1);
        count
    }

    /// Bounding box of all points
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        self.for_each_point(&mut |p| bounds.expand(p.x, p.y, p.z));
        bounds
    }

    /// Maximum Z across all points, `None` for an empty geometry
    pub fn max_z(&self) -> Option<f64> {
        let mut max_z: Option<f64> = None;
        self.for_each_point(&mut |p| {
            max_z = Some(max_z.map_or(p.z, |z| z.max(p.z)));
        });
        max_z
    }

    /// Open every polygon and ring in place
    pub fn open(&mut self) {
        match self {
            Self::Ring(points) => open_ring(points),
            Self::Polygon(polygon) => polygon.open(),
            Self::Multi(members) => members.iter_mut().for_each(|m| m.open()),
            Self::Point(_) | Self::LineString(_) => {}
        }
    }
}
