// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Crease-aware vertex normals
//!
//! Normals are averaged over the faces sharing a vertex, but only across
//! faces whose normals are within the crease angle of each other. Where a
//! vertex sits on a sharp edge it is duplicated so each side keeps its own
//! normal; the duplicate copies position and texture coordinate.

use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

/// Two normals closer than this are treated as the same vertex normal
const NORMAL_EPSILON: f64 = 1e-6;

fn vertex(mesh: &Mesh, i: u32) -> Point3<f64> {
    mesh.position(i as usize).cast::<f64>()
}

/// Unit face normals; `None` for zero-area triangles
fn face_normals(mesh: &Mesh) -> Vec<Option<Vector3<f64>>> {
    mesh.indices
        .chunks_exact(3)
        .map(|tri| {
            let v0 = vertex(mesh, tri[0]);
            let v1 = vertex(mesh, tri[1]);
            let v2 = vertex(mesh, tri[2]);
            (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12)
        })
        .collect()
}

/// Interior angle of face `f` at vertex `v`
fn corner_angle(mesh: &Mesh, f: usize, v: u32) -> f64 {
    let tri = &mesh.indices[f * 3..f * 3 + 3];
    let Some(k) = tri.iter().position(|&i| i == v) else {
        return 0.0;
    };
    let a = vertex(mesh, tri[k]);
    let b = vertex(mesh, tri[(k + 1) % 3]);
    let c = vertex(mesh, tri[(k + 2) % 3]);
    (b - a).angle(&(c - a))
}

/// Generate per-vertex normals, splitting vertices across edges sharper
/// than `crease_angle` (radians)
///
/// Face normals are weighted by their corner angle, so a wall split into
/// two triangles counts the same as one split into four.
pub fn smooth_with_crease(mesh: &mut Mesh, crease_angle: f64) {
    let vertex_count = mesh.vertex_count();
    if vertex_count == 0 {
        return;
    }

    let faces = face_normals(mesh);
    let mut incident: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); vertex_count];
    for (f, tri) in mesh.indices.chunks_exact(3).enumerate() {
        for &v in tri {
            if !incident[v as usize].contains(&(f as u32)) {
                incident[v as usize].push(f as u32);
            }
        }
    }

    let cos_crease = crease_angle.cos();
    let mut normals: Vec<Vector3<f64>> = vec![Vector3::z(); vertex_count];
    let mut duplicates: Vec<u32> = Vec::new();
    let mut indices = mesh.indices.clone();

    for v in 0..vertex_count {
        let around = &incident[v];
        let mut variants: SmallVec<[(Vector3<f64>, u32); 4]> = SmallVec::new();

        for &f in around {
            let f = f as usize;
            let weighted = |g: u32| -> Option<Vector3<f64>> {
                let n = faces[g as usize]?;
                Some(n * corner_angle(mesh, g as usize, v as u32))
            };
            let sum = match faces[f] {
                Some(unit) => around
                    .iter()
                    .filter(|&&g| {
                        faces[g as usize].is_some_and(|n| unit.dot(&n) >= cos_crease - 1e-9)
                    })
                    .filter_map(|&g| weighted(g))
                    .fold(Vector3::zeros(), |acc, n| acc + n),
                // Degenerate faces take the fully smoothed normal
                None => around
                    .iter()
                    .filter_map(|&g| weighted(g))
                    .fold(Vector3::zeros(), |acc, n| acc + n),
            };
            let normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);

            let target = match variants
                .iter()
                .find(|(n, _)| (n - normal).norm() < NORMAL_EPSILON)
            {
                Some(&(_, index)) => index,
                None => {
                    let index = if variants.is_empty() {
                        v as u32
                    } else {
                        duplicates.push(v as u32);
                        (vertex_count + duplicates.len() - 1) as u32
                    };
                    variants.push((normal, index));
                    index
                }
            };

            for corner in &mut indices[f * 3..f * 3 + 3] {
                if *corner == v as u32 {
                    *corner = target;
                }
            }
        }

        if let Some(&(normal, _)) = variants.first() {
            normals[v] = normal;
        }
        normals.extend(variants.iter().skip(1).map(|&(n, _)| n));
    }

    for &source in &duplicates {
        let p = mesh.position(source as usize);
        mesh.positions.extend_from_slice(&[p.x, p.y, p.z]);
        if let Some(tc) = mesh.tex_coords.as_mut() {
            let (u, v) = (tc[source as usize * 2], tc[source as usize * 2 + 1]);
            tc.push(u);
            tc.push(v);
        }
    }

    mesh.indices = indices;
    mesh.normals = normals
        .iter()
        .flat_map(|n| [n.x as f32, n.y as f32, n.z as f32])
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrusion::{extrude_shape, ExtrusionParams};
    use crate::localizer::Localizer;
    use crate::shape::Shape;
    use approx::assert_relative_eq;
    use extrude_lite_core::{SkinResource, SpatialReference};

    fn walls(points: Vec<Point3<f64>>, skin: Option<&SkinResource>) -> Mesh {
        let params = ExtrusionParams {
            wall_skin: skin,
            ..ExtrusionParams::default()
        };
        extrude_shape(
            &Shape::polygon(vec![points]),
            &params,
            &Localizer::identity(SpatialReference::Projected),
        )
        .unwrap()
        .walls
    }

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ]
    }

    #[test]
    fn test_square_corners_split() {
        let skin = SkinResource::new("brick", "brick.png", 5.0, 3.0);
        let mut mesh = walls(square(), Some(&skin));
        smooth_with_crease(&mut mesh, 60f64.to_radians());

        // Every corner vertex serves two perpendicular walls
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.normals.len(), 16 * 3);
        assert_eq!(mesh.tex_coords.as_ref().map(Vec::len), Some(32));
        assert_eq!(mesh.triangle_count(), 8);

        // Each triangle is flat shaded: all three corners agree with the face
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.position(tri[0] as usize);
            let b = mesh.position(tri[1] as usize);
            let c = mesh.position(tri[2] as usize);
            let face = (b - a).cross(&(c - a)).normalize();
            for &i in tri {
                let n = mesh.normal(i as usize).unwrap();
                assert_relative_eq!(n, face, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_first_wall_faces_outward() {
        let mut mesh = walls(square(), None);
        smooth_with_crease(&mut mesh, 60f64.to_radians());
        // Wall along y = 0 of a counter-clockwise footprint faces -y
        let n = mesh.normal(mesh.indices[0] as usize).unwrap();
        assert_relative_eq!(n, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_wide_crease_smooths_corners() {
        let mut mesh = walls(square(), None);
        smooth_with_crease(&mut mesh, 100f64.to_radians());
        assert_eq!(mesh.vertex_count(), 8);
        let n = mesh.normal(0).unwrap();
        let d = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(n, Vector3::new(-d, -d, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_shallow_bend_stays_smooth() {
        // 10 degree bend in a straight run of wall
        let bend = 10f64.to_radians();
        let mut line = Mesh::new();
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0 + 10.0 * bend.cos(), 10.0 * bend.sin(), 0.0),
        ];
        for p in &pts {
            line.add_vertex(&Point3::new(p.x, p.y, 5.0));
            line.add_vertex(p);
        }
        for p in [0u32, 2] {
            line.add_triangle(p, p + 1, p + 2);
            line.add_triangle(p + 1, p + 3, p + 2);
        }

        smooth_with_crease(&mut line, 60f64.to_radians());
        assert_eq!(line.vertex_count(), 6);
    }
}
