// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh consolidation
//!
//! Meshes in one batch share render state, so those with the same attribute
//! layout, color and name can be drawn as one. Runs only after every shape
//! has been processed, since indices are part-local until then.

use crate::mesh::Mesh;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};

/// Hash of everything that must match for two meshes to merge
#[inline]
fn layout_hash(mesh: &Mesh) -> u64 {
    let mut hasher = FxHasher::default();
    mesh.has_normals().hash(&mut hasher);
    mesh.tex_coords.is_some().hash(&mut hasher);
    mesh.color.map(|c| c.map(f32::to_bits)).hash(&mut hasher);
    mesh.name.hash(&mut hasher);
    hasher.finish()
}

/// Merge compatible meshes, keeping first-appearance order
pub fn consolidate(meshes: Vec<Mesh>) -> Vec<Mesh> {
    if meshes.len() < 2 {
        return meshes;
    }

    let before = meshes.len();
    let mut merged: Vec<Mesh> = Vec::with_capacity(meshes.len());
    // Layout hash -> slots in `merged` with that layout
    let mut slots: FxHashMap<u64, Vec<usize>> = FxHashMap::default();

    for mesh in meshes {
        if mesh.is_empty() {
            continue;
        }
        let candidates = slots.entry(layout_hash(&mesh)).or_default();
        let target = candidates.iter().copied().find(|&slot| {
            let existing = &merged[slot];
            existing.is_compatible(&mesh)
                && existing.vertex_count() + mesh.vertex_count() <= u32::MAX as usize
        });
        match target {
            Some(slot) => merged[slot].merge(&mesh),
            None => {
                candidates.push(merged.len());
                merged.push(mesh);
            }
        }
    }

    tracing::debug!(before, after = merged.len(), "Consolidated meshes");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn quad(x: f64, color: [f32; 4]) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(&Point3::new(x, 0.0, 0.0));
        mesh.add_vertex(&Point3::new(x + 1.0, 0.0, 0.0));
        mesh.add_vertex(&Point3::new(x + 1.0, 1.0, 0.0));
        mesh.add_vertex(&Point3::new(x, 1.0, 0.0));
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh.color = Some(color);
        mesh
    }

    #[test]
    fn test_same_color_merges() {
        let white = [1.0; 4];
        let out = consolidate(vec![quad(0.0, white), quad(5.0, white), quad(10.0, white)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].vertex_count(), 12);
        assert_eq!(out[0].triangle_count(), 6);
        assert_eq!(&out[0].indices[6..9], &[4, 5, 6]);
    }

    #[test]
    fn test_colors_stay_apart_in_order() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let blue = [0.0, 0.0, 1.0, 1.0];
        let out = consolidate(vec![quad(0.0, red), quad(1.0, blue), quad(2.0, red)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].color, Some(red));
        assert_eq!(out[0].vertex_count(), 8);
        assert_eq!(out[1].color, Some(blue));
    }

    #[test]
    fn test_named_meshes_stay_apart() {
        let white = [1.0; 4];
        let mut a = quad(0.0, white);
        a.name = Some("a".to_string());
        let mut b = quad(1.0, white);
        b.name = Some("b".to_string());
        assert_eq!(consolidate(vec![a, b]).len(), 2);
    }
}
