// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, Vector3};

/// A closed outline over a contiguous vertex range, kept until tessellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLoop {
    pub first: u32,
    pub count: u32,
}

impl LineLoop {
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }
}

/// Triangle mesh in local coordinates
///
/// Positions are converted to f32 only after localization, so they stay
/// small regardless of where the source features sit on the globe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); empty until normals are generated
    pub normals: Vec<f32>,
    /// Texture coordinates (u, v), one pair per vertex when present
    pub tex_coords: Option<Vec<f32>>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
    /// Outlines awaiting tessellation
    pub loops: Vec<LineLoop>,
    /// Overall color (RGBA); `None` leaves the texture untinted
    pub color: Option<[f32; 4]>,
    pub name: Option<String>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
            ..Self::default()
        }
    }

    /// Enable texture coordinates
    pub fn with_tex_coords(mut self) -> Self {
        let capacity = self.positions.capacity() / 3 * 2;
        self.tex_coords = Some(Vec::with_capacity(capacity));
        self
    }

    /// Add a vertex, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: &Point3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);
        index
    }

    /// Append a texture coordinate; ignored when the mesh carries none
    #[inline]
    pub fn add_tex_coord(&mut self, u: f64, v: f64) {
        if let Some(tc) = self.tex_coords.as_mut() {
            tc.push(u as f32);
            tc.push(v as f32);
        }
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Record a closed outline over `count` vertices starting at `first`
    #[inline]
    pub fn add_loop(&mut self, first: u32, count: u32) {
        if count > 0 {
            self.loops.push(LineLoop { first, count });
        }
    }

    /// Position of vertex `i`
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f32> {
        Point3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Texture coordinate of vertex `i`
    #[inline]
    pub fn tex_coord(&self, i: usize) -> Option<[f32; 2]> {
        self.tex_coords
            .as_ref()
            .map(|tc| [tc[i * 2], tc[i * 2 + 1]])
    }

    /// Normal of vertex `i`
    #[inline]
    pub fn normal(&self, i: usize) -> Option<Vector3<f32>> {
        if self.normals.len() < (i + 1) * 3 {
            return None;
        }
        Some(Vector3::new(
            self.normals[i * 3],
            self.normals[i * 3 + 1],
            self.normals[i * 3 + 2],
        ))
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Whether `other` can be merged into this mesh without changing how
    /// either renders
    pub fn is_compatible(&self, other: &Mesh) -> bool {
        self.has_normals() == other.has_normals()
            && self.tex_coords.is_some() == other.tex_coords.is_some()
            && self.color == other.color
            && self.name == other.name
    }

    /// Merge another mesh into this one
    ///
    /// Callers check [`Mesh::is_compatible`] first; merging meshes with
    /// different attribute layouts leaves the arrays misaligned.
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        // Indices and loops of `other` shift past our existing vertices
        let base = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        if let (Some(tc), Some(theirs)) = (self.tex_coords.as_mut(), &other.tex_coords) {
            tc.extend_from_slice(theirs);
        }
        self.indices.extend(other.indices.iter().map(|&i| base + i));
        self.loops.extend(other.loops.iter().map(|l| LineLoop {
            first: base + l.first,
            ..*l
        }));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned (min, max) corners; both at the origin for an empty mesh
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        let mut corners = (0..self.vertex_count()).map(|i| self.position(i));
        let Some(first) = corners.next() else {
            return (Point3::origin(), Point3::origin());
        };
        corners.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p)))
    }
}
