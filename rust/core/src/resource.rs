// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Skin (texture) resources and the libraries that serve them

use crate::style::SkinSymbol;
use serde::{Deserialize, Serialize};

/// How a texture combines with the fragment's base color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexEnvMode {
    #[default]
    Modulate,
    /// Texture replaces the color; no tint is applied
    Decal,
    Blend,
    Replace,
}

/// A texture that can be wrapped around walls or laid over roofs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinResource {
    pub name: String,
    pub image_url: String,
    /// Real-world width covered by one texture tile (metres)
    pub image_width: f64,
    /// Real-world height covered by one texture tile (metres)
    pub image_height: f64,
    /// Whether the texture repeats vertically
    pub is_tiled: bool,
    pub tex_env_mode: TexEnvMode,
    pub min_object_height: Option<f64>,
    pub max_object_height: Option<f64>,
    pub tags: Vec<String>,
}

impl Default for SkinResource {
    fn default() -> Self {
        Self {
            name: String::new(),
            image_url: String::new(),
            image_width: 10.0,
            image_height: 3.0,
            is_tiled: false,
            tex_env_mode: TexEnvMode::Modulate,
            min_object_height: None,
            max_object_height: None,
            tags: Vec::new(),
        }
    }
}

impl SkinResource {
    pub fn new(name: &str, image_url: &str, image_width: f64, image_height: f64) -> Self {
        Self {
            name: name.to_string(),
            image_url: image_url.to_string(),
            image_width,
            image_height,
            ..Self::default()
        }
    }

    /// Whether this skin satisfies a query symbol
    pub fn matches(&self, query: &SkinSymbol) -> bool {
        if let Some(h) = query.object_height {
            if self.min_object_height.is_some_and(|min| h < min) {
                return false;
            }
            if self.max_object_height.is_some_and(|max| h > max) {
                return false;
            }
        }
        query.tags.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Source of skin candidates for a query symbol
pub trait SkinLibrary {
    /// All skins matching `query`, in library order
    fn skins(&self, query: &SkinSymbol) -> Vec<&SkinResource>;
}

/// Named collection of skins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLibrary {
    pub name: String,
    pub skins: Vec<SkinResource>,
}

impl ResourceLibrary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            skins: Vec::new(),
        }
    }

    pub fn add_skin(&mut self, skin: SkinResource) {
        self.skins.push(skin);
    }
}

impl SkinLibrary for ResourceLibrary {
    fn skins(&self, query: &SkinSymbol) -> Vec<&SkinResource> {
        self.skins.iter().filter(|s| s.matches(query)).collect()
    }
}
