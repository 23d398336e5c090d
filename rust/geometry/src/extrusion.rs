// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion engine - raising 2D footprints into walls, roofs and bases
//!
//! Each point of a part yields a roof vertex and a base vertex on the wall
//! mesh, in that order. Consecutive pairs form quads of two triangles:
//!
//! ```text
//!  roof  p ---- p+2
//!        |  \    |
//!  base p+1 ---- p+3
//! ```
//!
//! Polygon parts close back to their first pair; line parts stay open.

use crate::localizer::Localizer;
use crate::mesh::Mesh;
use crate::rotation::apparent_rotation;
use crate::shape::Shape;
use extrude_lite_core::{SkinResource, TexEnvMode};
use nalgebra::Point3;

/// Inputs for extruding one shape
#[derive(Debug, Clone, Copy)]
pub struct ExtrusionParams<'a> {
    pub height: f64,
    /// Subtracted from both the height and the flattened roof elevation
    pub offset: f64,
    /// Put every roof vertex at the shape's highest top elevation
    pub flatten: bool,
    pub wall_color: [f32; 4],
    pub roof_color: [f32; 4],
    pub wall_skin: Option<&'a SkinResource>,
    pub roof_skin: Option<&'a SkinResource>,
    /// Emit roof outlines (polygons only)
    pub make_roof: bool,
    pub make_base: bool,
}

impl Default for ExtrusionParams<'_> {
    fn default() -> Self {
        Self {
            height: 10.0,
            offset: 0.0,
            flatten: true,
            wall_color: [1.0; 4],
            roof_color: [1.0; 4],
            wall_skin: None,
            roof_skin: None,
            make_roof: true,
            make_base: false,
        }
    }
}

/// Raw geometry produced for one shape
///
/// Roof and base meshes hold one closed outline per part; they are filled
/// in by tessellation afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedShape {
    pub walls: Mesh,
    pub roof: Option<Mesh>,
    pub base: Option<Mesh>,
    /// Angle the roof texture is aligned to, when the roof is textured
    pub roof_rotation: Option<f64>,
}

/// Shape-wide elevation statistics gathered before any vertex is emitted
#[derive(Debug, Clone, Copy)]
struct ElevationStats {
    /// Highest `z + height` over every point of every part
    target_elevation: f64,
    min_loc: Point3<f64>,
    max_loc: Point3<f64>,
}

impl ElevationStats {
    fn gather<'p>(points: impl Iterator<Item = &'p Point3<f64>>, height: f64) -> Self {
        let mut stats = Self {
            target_elevation: f64::MIN,
            min_loc: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max_loc: Point3::new(0.0, 0.0, f64::MIN),
        };
        for p in points {
            stats.target_elevation = stats.target_elevation.max(p.z + height);
            if p.z < stats.min_loc.z {
                stats.min_loc = *p;
            }
            if p.z > stats.max_loc.z {
                stats.max_loc = *p;
            }
        }
        stats
    }
}

/// Texture tile extent usable as a divisor; degenerate sizes fall back to 1
#[inline]
fn tile_size(size: f64) -> f64 {
    if size.is_finite() && size > f64::EPSILON {
        size
    } else {
        1.0
    }
}

/// Vertical tile size adjusted so a whole number of tiles spans `max_height`
#[inline]
pub fn adjusted_tile_height(max_height: f64, tile_height: f64) -> f64 {
    let tile_height = tile_size(tile_height);
    let mut div = (max_height / tile_height).round();
    if div == 0.0 {
        div = 1.0;
    }
    let adjusted = max_height / div;
    // Zero-height walls still need a finite divisor for texture V
    if adjusted.abs() > f64::EPSILON && adjusted.is_finite() {
        adjusted
    } else {
        tile_height
    }
}

/// Extrude one shape into local-frame meshes
///
/// Parts with fewer than two points are skipped. Returns `None` when no part
/// produced geometry.
pub fn extrude_shape(
    shape: &Shape,
    params: &ExtrusionParams<'_>,
    localizer: &Localizer,
) -> Option<ExtrudedShape> {
    let parts: Vec<&[Point3<f64>]> = shape
        .parts
        .iter()
        .filter(|part| {
            if part.len() < 2 {
                tracing::debug!(points = part.len(), "Skipping degenerate part");
                return false;
            }
            true
        })
        .map(Vec::as_slice)
        .collect();

    if parts.is_empty() {
        return None;
    }

    let wall_skin = params.wall_skin;
    let tex_width = wall_skin.map_or(1.0, |s| tile_size(s.image_width));
    let tex_height = wall_skin.map_or(1.0, |s| tile_size(s.image_height));
    let tex_repeats_y = wall_skin.is_some_and(|s| s.is_tiled);
    let use_color = wall_skin.map_or(true, |s| s.tex_env_mode != TexEnvMode::Decal);

    let point_count: usize = parts.iter().map(|p| p.len()).sum();
    let is_polygon = shape.is_polygon();

    let mut walls = Mesh::with_capacity(point_count * 2, point_count * 6);
    if wall_skin.is_some() {
        walls = walls.with_tex_coords();
    }
    walls.color = use_color.then_some(params.wall_color);

    let mut roof = (params.make_roof && is_polygon).then(|| {
        let mut mesh = Mesh::with_capacity(point_count, 0);
        if params.roof_skin.is_some() {
            mesh = mesh.with_tex_coords();
        }
        mesh.color = Some(params.roof_color);
        mesh
    });

    let mut base = params.make_base.then(|| Mesh::with_capacity(point_count, 0));

    let stats = ElevationStats::gather(parts.iter().flat_map(|p| p.iter()), params.height);

    tracing::trace!(
        min_z = stats.min_loc.z,
        max_z = stats.max_loc.z,
        target = stats.target_elevation,
        "Shape elevation range"
    );

    let height = params.height - params.offset;
    let target_elevation = stats.target_elevation - params.offset;

    for part in &parts {
        let max_height = target_elevation - stats.min_loc.z;
        let tex_height_adj = adjusted_tile_height(max_height, tex_height);

        let wall_first = walls.vertex_count() as u32;
        let roof_first = roof.as_ref().map_or(0, |m| m.vertex_count() as u32);
        let mut part_len = 0.0;
        let mut prev_roof: Option<Point3<f64>> = None;
        let mut base_points = Vec::with_capacity(if base.is_some() { part.len() } else { 0 });

        for (i, base_pt) in part.iter().enumerate() {
            let roof_pt = if params.flatten {
                Point3::new(base_pt.x, base_pt.y, target_elevation)
            } else {
                Point3::new(base_pt.x, base_pt.y, base_pt.z + height)
            };

            let roof_local = localizer.to_local(&roof_pt);
            let base_local = localizer.to_local(base_pt);

            if let Some(prev) = prev_roof {
                part_len += (roof_local - prev).norm();
            }
            prev_roof = Some(roof_local);

            let p = walls.add_vertex(&roof_local);
            walls.add_vertex(&base_local);

            if wall_skin.is_some() {
                let h = if tex_repeats_y {
                    -(roof_local - base_local).norm()
                } else {
                    -tex_height_adj
                };
                let u = part_len / tex_width;
                walls.add_tex_coord(u, 0.0);
                walls.add_tex_coord(u, h / tex_height_adj);
            }

            if i + 1 == part.len() {
                if is_polygon {
                    // Wrap around to the first pair
                    walls.add_triangle(p, p + 1, wall_first);
                    walls.add_triangle(p + 1, wall_first + 1, wall_first);
                }
            } else {
                walls.add_triangle(p, p + 1, p + 2);
                walls.add_triangle(p + 1, p + 3, p + 2);
            }

            if let Some(roof) = roof.as_mut() {
                roof.add_vertex(&roof_local);
            }
            if base.is_some() {
                base_points.push(base_local);
            }
        }

        if let Some(roof) = roof.as_mut() {
            roof.add_loop(roof_first, part.len() as u32);
        }

        if let Some(base) = base.as_mut() {
            let base_first = base.vertex_count() as u32;
            for p in base_points.iter().rev() {
                base.add_vertex(p);
            }
            base.add_loop(base_first, part.len() as u32);
        }
    }

    let roof_rotation = match (roof.as_mut(), params.roof_skin) {
        (Some(roof), Some(skin)) => Some(apply_roof_tex_coords(roof, skin)),
        _ => None,
    };

    Some(ExtrudedShape {
        walls,
        roof,
        base,
        roof_rotation,
    })
}

/// Planar roof texture coordinates aligned with the longest outer edge
///
/// Returns the rotation used.
fn apply_roof_tex_coords(roof: &mut Mesh, skin: &SkinResource) -> f64 {
    let outer: Vec<Point3<f64>> = roof
        .loops
        .first()
        .map(|l| {
            l.range()
                .map(|i| roof.position(i).cast::<f64>())
                .collect()
        })
        .unwrap_or_default();

    let rotation = apparent_rotation(&outer);
    let (sin_r, cos_r) = rotation.sin_cos();
    let origin = outer.first().copied().unwrap_or_else(Point3::origin);
    let width = tile_size(skin.image_width);
    let height = tile_size(skin.image_height);

    let coords: Vec<f32> = (0..roof.vertex_count())
        .flat_map(|i| {
            let d = roof.position(i).cast::<f64>() - origin;
            let u = (d.x * cos_r + d.y * sin_r) / width;
            let v = (-d.x * sin_r + d.y * cos_r) / height;
            [u as f32, v as f32]
        })
        .collect();
    roof.tex_coords = Some(coords);

    rotation
}
