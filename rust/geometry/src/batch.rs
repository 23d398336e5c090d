// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grouping extruded meshes by render state
//!
//! Each distinct wall texture state (image plus how it combines with the
//! vertex color) gets one batch; untextured geometry and every roof share the
//! "no texture" batch. The group carries the transform that
//! puts its local-frame meshes back in the world.

use crate::consolidate::consolidate;
use crate::mesh::Mesh;
use extrude_lite_core::{SkinResource, TexEnvMode};
use nalgebra::Matrix4;
use std::collections::BTreeMap;
use std::fmt;

/// Texture binding that a textured batch renders with
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct TextureState {
    image_url: String,
    tex_env_mode: TexEnvMode,
}

/// Render-state identity of a batch: the texture it binds and its
/// environment mode, if any
///
/// Ordered so the untextured key sorts first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(Option<TextureState>);

impl StateKey {
    /// The untextured state
    pub const NONE: StateKey = StateKey(None);

    pub fn for_skin(skin: Option<&SkinResource>) -> Self {
        Self(skin.map(|s| TextureState {
            image_url: s.image_url.clone(),
            tex_env_mode: s.tex_env_mode,
        }))
    }

    pub fn texture(&self) -> Option<&str> {
        self.0.as_ref().map(|t| t.image_url.as_str())
    }

    pub fn tex_env_mode(&self) -> Option<TexEnvMode> {
        self.0.as_ref().map(|t| t.tex_env_mode)
    }

    #[inline]
    pub fn is_textured(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(t) if t.tex_env_mode == TexEnvMode::Modulate => f.write_str(&t.image_url),
            Some(t) => write!(f, "{} ({:?})", t.image_url, t.tex_env_mode),
            None => f.write_str("<none>"),
        }
    }
}

/// Meshes sharing one render state
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub key: StateKey,
    /// Texture bound for this batch
    pub skin: Option<SkinResource>,
    pub meshes: Vec<Mesh>,
}

impl Batch {
    pub fn new(key: StateKey, skin: Option<SkinResource>) -> Self {
        Self {
            key,
            skin,
            meshes: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

/// Output of one extrusion pass
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionGroup {
    /// Places local-frame vertices in the world; identity when no
    /// localization was needed
    pub local_to_world: Matrix4<f64>,
    /// Sorted by state key, untextured first
    pub batches: Vec<Batch>,
}

impl Default for ExtrusionGroup {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExtrusionGroup {
    pub fn empty() -> Self {
        Self {
            local_to_world: Matrix4::identity(),
            batches: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.iter().all(|b| b.meshes.is_empty())
    }

    pub fn mesh_count(&self) -> usize {
        self.batches.iter().map(|b| b.meshes.len()).sum()
    }

    pub fn batch(&self, key: &StateKey) -> Option<&Batch> {
        self.batches.iter().find(|b| &b.key == key)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.batches.iter().flat_map(|b| b.meshes.iter())
    }
}

/// Collects meshes into per-state batches
#[derive(Debug, Default)]
pub struct BatchAssembler {
    batches: BTreeMap<StateKey, Batch>,
}

impl BatchAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the batch for `key`, creating it on first use
    pub fn add(&mut self, key: StateKey, skin: Option<&SkinResource>, mesh: Mesh) {
        self.batches
            .entry(key)
            .or_insert_with_key(|key| Batch::new(key.clone(), skin.cloned()))
            .meshes
            .push(mesh);
    }

    /// Roofs and bases always go to the untextured batch
    pub fn add_untextured(&mut self, mesh: Mesh) {
        self.add(StateKey::NONE, None, mesh);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Merge compatible meshes inside every batch
    pub fn consolidate(&mut self) {
        for batch in self.batches.values_mut() {
            batch.meshes = consolidate(std::mem::take(&mut batch.meshes));
        }
    }

    pub fn finish(self, local_to_world: Matrix4<f64>) -> ExtrusionGroup {
        ExtrusionGroup {
            local_to_world,
            batches: self.batches.into_values().collect(),
        }
    }
}
