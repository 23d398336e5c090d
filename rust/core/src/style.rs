// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Style symbols and style sheets
//!
//! Only the symbols that feed extrusion are modelled: the extrusion symbol
//! itself, skin (texture) symbols and polygon fill symbols.

use crate::error::{Error, Result};
use crate::expression::NumericExpression;
use crate::resource::ResourceLibrary;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA color, components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#rrggbb` or `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| Error::InvalidColor(s.to_string()))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

/// What extrusion heights are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightReference {
    /// Height is added to each point's own elevation
    #[default]
    Z,
    /// Height is measured from mean sea level
    Msl,
}

/// Extrusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrusionSymbol {
    /// Fixed height used when no expression or callback applies
    pub height: f64,
    pub height_expression: Option<NumericExpression>,
    pub height_reference: HeightReference,
    /// Force a flat roof at the shape's highest top elevation
    pub flatten: bool,
    pub wall_style_name: Option<String>,
    pub roof_style_name: Option<String>,
}

impl Default for ExtrusionSymbol {
    fn default() -> Self {
        Self {
            height: 10.0,
            height_expression: None,
            height_reference: HeightReference::Z,
            flatten: true,
            wall_style_name: None,
            roof_style_name: None,
        }
    }
}

/// Texture query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinSymbol {
    pub library_name: Option<String>,
    /// Height of the object being skinned, filled in per shape
    pub object_height: Option<f64>,
    pub tags: Vec<String>,
}

/// Polygon fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonSymbol {
    pub fill: Color,
}

/// A named bundle of symbols
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub name: String,
    pub extrusion: Option<ExtrusionSymbol>,
    pub skin: Option<SkinSymbol>,
    pub polygon: Option<PolygonSymbol>,
}

impl Style {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_extrusion(mut self, symbol: ExtrusionSymbol) -> Self {
        self.extrusion = Some(symbol);
        self
    }

    pub fn with_skin(mut self, symbol: SkinSymbol) -> Self {
        self.skin = Some(symbol);
        self
    }

    pub fn with_polygon(mut self, symbol: PolygonSymbol) -> Self {
        self.polygon = Some(symbol);
        self
    }
}

/// Named styles plus the resource libraries they reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub styles: FxHashMap<String, Style>,
    pub libraries: FxHashMap<String, ResourceLibrary>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; map keys name their styles and libraries
    pub fn from_json(json: &str) -> Result<Self> {
        let mut sheet: StyleSheet = serde_json::from_str(json)?;
        for (key, style) in sheet.styles.iter_mut() {
            if style.name.is_empty() {
                style.name = key.clone();
            }
        }
        for (key, lib) in sheet.libraries.iter_mut() {
            if lib.name.is_empty() {
                lib.name = key.clone();
            }
        }
        Ok(sheet)
    }

    pub fn add_style(&mut self, style: Style) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn add_library(&mut self, library: ResourceLibrary) {
        self.libraries.insert(library.name.clone(), library);
    }

    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    pub fn resource_library(&self, name: &str) -> Option<&ResourceLibrary> {
        self.libraries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::TexEnvMode;

    #[test]
    fn test_color_parse() {
        let c: Color = "#ff8000".parse().unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);

        let c: Color = "#00000080".parse().unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);

        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_extrusion_defaults() {
        let symbol = ExtrusionSymbol::default();
        assert_eq!(symbol.height, 10.0);
        assert!(symbol.flatten);
        assert_eq!(symbol.height_reference, HeightReference::Z);
    }

    #[test]
    fn test_style_sheet_from_json() {
        let json = r##"{
            "styles": {
                "buildings": {
                    "extrusion": {
                        "height_expression": "[levels] * 3",
                        "height_reference": "msl",
                        "wall_style_name": "walls"
                    }
                },
                "walls": {
                    "skin": { "library_name": "facades" },
                    "polygon": { "fill": "#808080" }
                }
            },
            "libraries": {
                "facades": {
                    "skins": [
                        { "name": "brick", "image_url": "brick.png", "image_width": 6.0,
                          "image_height": 3.0, "is_tiled": true, "tex_env_mode": "decal" }
                    ]
                }
            }
        }"##;

        let sheet = StyleSheet::from_json(json).unwrap();
        let buildings = sheet.style("buildings").unwrap();
        assert_eq!(buildings.name, "buildings");
        let extrusion = buildings.extrusion.as_ref().unwrap();
        assert_eq!(extrusion.height_reference, HeightReference::Msl);
        assert!(extrusion.flatten);
        assert_eq!(
            extrusion.height_expression.as_ref().map(|e| e.source()),
            Some("[levels] * 3")
        );

        let lib = sheet.resource_library("facades").unwrap();
        assert_eq!(lib.name, "facades");
        assert_eq!(lib.skins[0].tex_env_mode, TexEnvMode::Decal);
        assert!(lib.skins[0].is_tiled);
    }

    #[test]
    fn test_style_sheet_rejects_bad_expression() {
        let json = r#"{ "styles": { "b": { "extrusion": { "height_expression": "[a] *" } } } }"#;
        assert!(StyleSheet::from_json(json).is_err());
    }
}
