// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for filling roof and base outlines. The first
//! outline of a mesh is the outer boundary and later ones are holes, which
//! matches odd winding for simple rings.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use nalgebra::{Point2, Vector3};

/// Which way filled outlines face in the local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
}

impl Facing {
    #[inline]
    fn normal(self) -> Vector3<f64> {
        match self {
            Facing::Up => Vector3::z(),
            Facing::Down => -Vector3::z(),
        }
    }
}

/// Check if a polygon is convex (all cross products have same sign)
#[inline]
fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];

        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    true
}

/// Simple fan triangulation for convex polygons
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity((n - 2) * 3);
    for i in 1..n - 1 {
        indices.push(0);
        indices.push(i);
        indices.push(i + 1);
    }
    indices
}

/// Twice the signed area of a triangle; positive when counter-clockwise
#[inline]
fn signed_area2(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Interleave 2D points into the flat `[x0, y0, x1, y1, ...]` layout earcut reads
fn flatten_xy<'a>(rings: impl IntoIterator<Item = &'a [Point2<f64>]>) -> (Vec<f64>, Vec<usize>) {
    let mut vertices = Vec::new();
    let mut ring_starts = Vec::new();
    for ring in rings {
        ring_starts.push(vertices.len() / 2);
        vertices.extend(ring.iter().flat_map(|p| [p.x, p.y]));
    }
    (vertices, ring_starts)
}

fn earcut(vertices: &[f64], hole_starts: &[usize]) -> Result<Vec<usize>> {
    earcutr::earcut(vertices, hole_starts, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Triangulate a simple polygon (no holes)
///
/// Returns triangle indices into `points`.
#[inline]
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();
    if n < 3 {
        return Err(Error::TriangulationError(format!(
            "Outline has {} points, need at least 3",
            n
        )));
    }

    // A lone triangle needs no work
    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    // Footprints are mostly small convex blocks; a fan is exact for those
    if n <= 8 && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    // Concave outline: ear clipping
    let (vertices, _) = flatten_xy([points]);
    earcut(&vertices, &[])
}

/// Triangulate a polygon with holes
///
/// Returns triangle indices into the outer ring followed by every hole, in
/// order.
#[inline]
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::TriangulationError(format!(
            "Outer boundary has {} points, need at least 3",
            outer.len()
        )));
    }

    // Without holes the cheaper paths above apply
    if holes.is_empty() {
        return triangulate_polygon(outer);
    }
    if let Some(hole) = holes.iter().find(|h| h.len() < 3) {
        return Err(Error::TriangulationError(format!(
            "Hole with {} points",
            hole.len()
        )));
    }

    let rings = std::iter::once(outer).chain(holes.iter().map(Vec::as_slice));
    let (vertices, ring_starts) = flatten_xy(rings);
    // earcut wants only the hole starts; the outer ring always starts at 0
    earcut(&vertices, &ring_starts[1..])
}

/// Fill a mesh's outlines with triangles facing `facing`
///
/// Outlines are projected onto the local XY plane. Holes with fewer than
/// three points are dropped; the outlines are consumed and every vertex
/// gets the facing normal.
pub fn tessellate_loops(mesh: &mut Mesh, facing: Facing) -> Result<()> {
    let Some(outer_loop) = mesh.loops.first().copied() else {
        return Err(Error::TriangulationError("Mesh has no outline".to_string()));
    };

    let project = |range: std::ops::Range<usize>| -> (Vec<Point2<f64>>, Vec<u32>) {
        range
            .map(|i| {
                let p = mesh.position(i);
                (Point2::new(p.x as f64, p.y as f64), i as u32)
            })
            .unzip()
    };

    let (outer, mut vertex_map) = project(outer_loop.range());
    let mut holes = Vec::with_capacity(mesh.loops.len().saturating_sub(1));
    for hole_loop in mesh.loops.iter().skip(1) {
        if hole_loop.count < 3 {
            tracing::debug!(points = hole_loop.count, "Dropping degenerate hole");
            continue;
        }
        let (hole, map) = project(hole_loop.range());
        holes.push(hole);
        vertex_map.extend(map);
    }

    let triangles = triangulate_polygon_with_holes(&outer, &holes)?;

    let all_points: Vec<&Point2<f64>> = outer.iter().chain(holes.iter().flatten()).collect();
    let want_ccw = facing == Facing::Up;

    let mut indices = Vec::with_capacity(triangles.len());
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ccw = signed_area2(all_points[a], all_points[b], all_points[c]) >= 0.0;
        let (b, c) = if ccw == want_ccw { (b, c) } else { (c, b) };
        indices.extend([vertex_map[a], vertex_map[b], vertex_map[c]]);
    }

    let normal = facing.normal();
    mesh.indices = indices;
    mesh.loops.clear();
    mesh.normals = (0..mesh.vertex_count())
        .flat_map(|_| [normal.x as f32, normal.y as f32, normal.z as f32])
        .collect();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn outline(mesh: &mut Mesh, points: &[(f64, f64)], z: f64) {
        let first = mesh.vertex_count() as u32;
        for &(x, y) in points {
            mesh.add_vertex(&Point3::new(x, y, z));
        }
        mesh.add_loop(first, points.len() as u32);
    }

    fn facing_z(mesh: &Mesh) -> Vec<f32> {
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let a = mesh.position(t[0] as usize);
                let b = mesh.position(t[1] as usize);
                let c = mesh.position(t[2] as usize);
                (b - a).cross(&(c - a)).z
            })
            .collect()
    }

    #[test]
    fn test_triangulate_square() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert_eq!(triangulate_polygon(&points).unwrap().len(), 6);
    }

    #[test]
    fn test_triangulate_concave_quad() {
        // Arrowhead; a naive fan from vertex 0 would cover the notch
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 4.0),
        ];
        assert!(!is_convex(&points));
        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_triangulate_insufficient_points() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(triangulate_polygon(&points).is_err());
    }

    #[test]
    fn test_triangulate_square_with_hole() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let hole = vec![
            Point2::new(3.0, 3.0),
            Point2::new(7.0, 3.0),
            Point2::new(7.0, 7.0),
            Point2::new(3.0, 7.0),
        ];

        let indices = triangulate_polygon_with_holes(&outer, &[hole]).unwrap();
        // 8 vertices, one hole: 8 triangles
        assert_eq!(indices.len(), 24);
    }

    #[test]
    fn test_tessellate_roof_faces_up() {
        // Clockwise input still faces up afterwards
        let mut mesh = Mesh::new();
        outline(&mut mesh, &[(0.0, 0.0), (0.0, 5.0), (5.0, 5.0), (5.0, 0.0)], 10.0);

        tessellate_loops(&mut mesh, Facing::Up).unwrap();
        assert!(mesh.loops.is_empty());
        assert_eq!(mesh.triangle_count(), 2);
        assert!(facing_z(&mesh).iter().all(|&z| z > 0.0));
        assert_eq!(mesh.normal(3), Some(Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_tessellate_with_hole_and_facing_down() {
        let mut mesh = Mesh::new();
        outline(&mut mesh, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)], 0.0);
        outline(&mut mesh, &[(3.0, 3.0), (3.0, 7.0), (7.0, 7.0), (7.0, 3.0)], 0.0);

        tessellate_loops(&mut mesh, Facing::Down).unwrap();
        assert_eq!(mesh.triangle_count(), 8);
        assert!(facing_z(&mesh).iter().all(|&z| z < 0.0));
        assert_eq!(mesh.normal(0), Some(Vector3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_degenerate_hole_dropped() {
        let mut mesh = Mesh::new();
        outline(&mut mesh, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], 0.0);
        outline(&mut mesh, &[(1.0, 1.0), (2.0, 1.0)], 0.0);

        tessellate_loops(&mut mesh, Facing::Up).unwrap();
        assert_eq!(mesh.indices.len(), 3);
        assert!(mesh.indices.iter().all(|&i| i < 3));
    }

    #[test]
    fn test_tessellate_without_outline_fails() {
        let mut mesh = Mesh::new();
        assert!(tessellate_loops(&mut mesh, Facing::Up).is_err());
    }
}
