// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The extrusion filter
//!
//! `push` resolves the style once, prepares one job per shape (height, skin
//! and color selection happen here, in feature order), extrudes and
//! post-processes the jobs, and finally sorts the meshes into batches.

use crate::batch::{BatchAssembler, ExtrusionGroup, StateKey};
use crate::context::FilterContext;
use crate::extrusion::{extrude_shape, ExtrudedShape, ExtrusionParams};
use crate::height::{HeightCallback, HeightResolver};
use crate::localizer::Localizer;
use crate::mesh::Mesh;
use crate::options::ExtrudeOptions;
use crate::shape::Shape;
use crate::smoothing::smooth_with_crease;
use crate::triangulation::{tessellate_loops, Facing};
use extrude_lite_core::{
    Color, ExtrusionSymbol, Feature, SkinLibrary, SkinResource, SkinSymbol, Style, StyleSheet,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Style symbols resolved for one `push`
struct ResolvedStyle<'a> {
    extrusion: ExtrusionSymbol,
    heights: HeightResolver,
    wall_skin: Option<SkinSymbol>,
    roof_skin: Option<SkinSymbol>,
    wall_color: Color,
    roof_color: Color,
    wall_library: Option<&'a dyn SkinLibrary>,
    roof_library: Option<&'a dyn SkinLibrary>,
}

/// Everything needed to extrude one shape
struct ShapeJob<'a> {
    shape: Shape,
    params: ExtrusionParams<'a>,
    name: Option<String>,
}

/// Turns footprint features into extruded wall and roof meshes
pub struct ExtrudeGeometryFilter {
    style: Style,
    options: ExtrudeOptions,
    height_callback: Option<Arc<dyn HeightCallback>>,
}

impl ExtrudeGeometryFilter {
    pub fn new(style: Style) -> Self {
        Self::with_options(style, ExtrudeOptions::default())
    }

    pub fn with_options(style: Style, options: ExtrudeOptions) -> Self {
        Self {
            style,
            options,
            height_callback: None,
        }
    }

    /// Override per-feature heights; takes priority over height expressions
    pub fn set_height_callback(&mut self, callback: Arc<dyn HeightCallback>) {
        self.height_callback = Some(callback);
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    pub fn options(&self) -> &ExtrudeOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ExtrudeOptions {
        &mut self.options
    }

    /// Extrude `features`, picking among matching skins with a generator
    /// seeded from the options
    pub fn push(&self, features: &[Feature], context: &FilterContext) -> ExtrusionGroup {
        let mut rng = match self.options.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.push_with_rng(features, context, &mut rng)
    }

    /// Extrude `features` using `rng` for skin selection
    pub fn push_with_rng<R: Rng>(
        &self,
        features: &[Feature],
        context: &FilterContext,
        rng: &mut R,
    ) -> ExtrusionGroup {
        let Some(resolved) = self.reset(context.style_sheet()) else {
            tracing::warn!("Missing required extrusion symbology; geometry will be empty");
            return ExtrusionGroup::empty();
        };

        let extent = context.extent_for(features);
        let localizer = Localizer::new(&extent, context.geocentric);

        let jobs = self.prepare(features, &resolved, rng);
        tracing::debug!(
            features = features.len(),
            shapes = jobs.len(),
            geocentric = localizer.is_geocentric(),
            "Extruding shapes"
        );

        let crease_angle = self.options.wall_crease_angle();
        let build = |job: &ShapeJob<'_>| build_shape(job, &localizer, crease_angle);
        let built: Vec<Option<ExtrudedShape>> = if self.options.parallel {
            jobs.par_iter().map(build).collect()
        } else {
            jobs.iter().map(build).collect()
        };

        let mut assembler = BatchAssembler::new();
        for (job, shape) in jobs.iter().zip(built) {
            let Some(shape) = shape else {
                continue;
            };
            let skin = job.params.wall_skin;
            assembler.add(StateKey::for_skin(skin), skin, shape.walls);
            if let Some(roof) = shape.roof {
                assembler.add_untextured(roof);
            }
            if let Some(base) = shape.base {
                assembler.add_untextured(base);
            }
        }

        if self.options.consolidates() {
            assembler.consolidate();
        }

        let group = assembler.finish(*localizer.local_to_world());
        tracing::info!(
            groups = group.batches.len(),
            meshes = group.mesh_count(),
            "Sorted geometry into {} groups",
            group.batches.len()
        );
        group
    }

    /// Resolve the style symbols feeding this pass
    fn reset<'a>(&self, sheet: Option<&'a StyleSheet>) -> Option<ResolvedStyle<'a>> {
        let extrusion = self.style.extrusion.clone()?;

        let named = |name: &Option<String>| -> Option<&'a Style> {
            let name = name.as_deref()?;
            let style = sheet?.style(name);
            if style.is_none() {
                tracing::debug!(style = name, "Named style not found");
            }
            style
        };
        let wall_style = named(&extrusion.wall_style_name);
        let roof_style = named(&extrusion.roof_style_name);

        // The filter's own symbols fill any slot the named styles leave empty
        let wall_skin = wall_style
            .and_then(|s| s.skin.clone())
            .or_else(|| self.style.skin.clone());
        let roof_skin = roof_style
            .and_then(|s| s.skin.clone())
            .or_else(|| self.style.skin.clone());
        let wall_polygon = wall_style.and_then(|s| s.polygon).or(self.style.polygon);
        let roof_polygon = roof_style.and_then(|s| s.polygon).or(self.style.polygon);

        let wall_library = resolve_library(sheet, wall_skin.as_ref(), "wall");
        let roof_library = resolve_library(sheet, roof_skin.as_ref(), "roof");

        Some(ResolvedStyle {
            heights: HeightResolver::new(&extrusion, self.height_callback.clone()),
            extrusion,
            wall_skin,
            roof_skin,
            wall_color: wall_polygon.map(|p| p.fill).unwrap_or_default(),
            roof_color: roof_polygon.map(|p| p.fill).unwrap_or_default(),
            wall_library,
            roof_library,
        })
    }

    /// One job per extrudable shape, in feature order
    fn prepare<'a, R: Rng>(
        &self,
        features: &[Feature],
        resolved: &ResolvedStyle<'a>,
        rng: &mut R,
    ) -> Vec<ShapeJob<'a>> {
        let name_expr = self
            .options
            .feature_name_expr
            .as_ref()
            .filter(|e| !e.is_empty());

        let mut jobs = Vec::new();
        for feature in features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let name = name_expr
                .map(|e| feature.eval_string(e))
                .filter(|n| !n.is_empty());

            for shape in Shape::from_geometry(geometry) {
                let height = resolved.heights.height(feature);
                let offset = resolved.heights.offset(feature);

                let wall_skin = select_skin(
                    resolved.wall_library,
                    resolved.wall_skin.as_ref(),
                    Some(height),
                    rng,
                );
                let roof_skin =
                    select_skin(resolved.roof_library, resolved.roof_skin.as_ref(), None, rng);

                let params = ExtrusionParams {
                    height,
                    offset,
                    flatten: resolved.extrusion.flatten,
                    wall_color: resolved.wall_color.to_array(),
                    roof_color: resolved.roof_color.to_array(),
                    wall_skin,
                    roof_skin,
                    make_roof: shape.is_polygon(),
                    make_base: self.options.generate_base,
                };
                jobs.push(ShapeJob {
                    shape,
                    params,
                    name: name.clone(),
                });
            }
        }
        jobs
    }
}

impl std::fmt::Debug for ExtrudeGeometryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtrudeGeometryFilter")
            .field("style", &self.style.name)
            .field("options", &self.options)
            .field("height_callback", &self.height_callback.is_some())
            .finish()
    }
}

fn resolve_library<'a>(
    sheet: Option<&'a StyleSheet>,
    skin: Option<&SkinSymbol>,
    channel: &str,
) -> Option<&'a dyn SkinLibrary> {
    let name = skin?.library_name.as_deref()?;
    match sheet?.resource_library(name) {
        Some(library) => Some(library),
        None => {
            tracing::warn!(
                library = name,
                "Unable to load resource library; {} geometry will not be textured",
                channel
            );
            None
        }
    }
}

/// Query a library and pick one matching skin, uniformly among several
fn select_skin<'a, R: Rng>(
    library: Option<&'a dyn SkinLibrary>,
    symbol: Option<&SkinSymbol>,
    object_height: Option<f64>,
    rng: &mut R,
) -> Option<&'a SkinResource> {
    let (library, symbol) = (library?, symbol?);
    let mut query = symbol.clone();
    if object_height.is_some() {
        query.object_height = object_height;
    }

    let candidates = library.skins(&query);
    let skin = match candidates.len() {
        0 => None,
        1 => Some(candidates[0]),
        n => Some(candidates[rng.gen_range(0..n)]),
    };
    tracing::debug!(
        candidates = candidates.len(),
        skin = ?skin.map(|s| &s.name),
        "Selected skin"
    );
    skin
}

/// Extrude and post-process one shape
fn build_shape(
    job: &ShapeJob<'_>,
    localizer: &Localizer,
    crease_angle: f64,
) -> Option<ExtrudedShape> {
    let mut out = extrude_shape(&job.shape, &job.params, localizer)?;

    smooth_with_crease(&mut out.walls, crease_angle);

    tessellate_cap(&mut out.roof, Facing::Up, "roof");
    tessellate_cap(&mut out.base, Facing::Down, "base");

    if let Some(name) = &job.name {
        out.walls.name = Some(name.clone());
        for mesh in out.roof.iter_mut().chain(out.base.iter_mut()) {
            mesh.name = Some(name.clone());
        }
    }

    Some(out)
}

/// Fill a roof or base outline, dropping the cap when it cannot be filled
fn tessellate_cap(cap: &mut Option<Mesh>, facing: Facing, which: &str) {
    let Some(mesh) = cap.as_mut() else {
        return;
    };
    // Two-point footprints only make a wall
    if mesh.loops.first().map_or(true, |outline| outline.count < 3) {
        tracing::debug!(cap = which, "Outline too small to fill");
        *cap = None;
        return;
    }
    if let Err(e) = tessellate_loops(mesh, facing) {
        tracing::warn!(cap = which, error = %e, "Tessellation failed; keeping walls only");
        *cap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrude_lite_core::{PolygonSymbol, ResourceLibrary};

    fn library() -> ResourceLibrary {
        let mut lib = ResourceLibrary::new("facades");
        for name in ["a", "b", "c", "d"] {
            lib.add_skin(SkinResource::new(name, &format!("{}.png", name), 4.0, 3.0));
        }
        lib
    }

    #[test]
    fn test_select_skin_single_candidate_skips_rng() {
        let mut lib = ResourceLibrary::new("facades");
        lib.add_skin(SkinResource::new("only", "only.png", 4.0, 3.0));
        let symbol = SkinSymbol::default();

        let mut rng = StdRng::seed_from_u64(1);
        let before = rng.clone();
        let skin = select_skin(Some(&lib), Some(&symbol), Some(10.0), &mut rng);
        assert_eq!(skin.map(|s| s.name.as_str()), Some("only"));
        // Nothing was drawn
        assert_eq!(rng.gen::<u64>(), before.clone().gen::<u64>());
    }

    #[test]
    fn test_select_skin_seeded() {
        let lib = library();
        let symbol = SkinSymbol::default();
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..8)
                .map(|_| {
                    select_skin(Some(&lib), Some(&symbol), None, &mut rng)
                        .map(|s| s.name.clone())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(3), picks(3));
        assert!(picks(3).iter().all(Option::is_some));
    }

    #[test]
    fn test_select_skin_without_library() {
        let mut rng = StdRng::seed_from_u64(1);
        let symbol = SkinSymbol::default();
        assert!(select_skin(None, Some(&symbol), None, &mut rng).is_none());
        assert!(select_skin(Some(&library()), None, None, &mut rng).is_none());
    }

    #[test]
    fn test_reset_falls_back_to_own_symbols() {
        let mut sheet = StyleSheet::new();
        sheet.add_library(library());
        sheet.add_style(Style::new("roofs").with_polygon(PolygonSymbol {
            fill: Color::new(1.0, 0.0, 0.0, 1.0),
        }));

        let style = Style::new("buildings")
            .with_extrusion(ExtrusionSymbol {
                roof_style_name: Some("roofs".to_string()),
                ..ExtrusionSymbol::default()
            })
            .with_skin(SkinSymbol {
                library_name: Some("facades".to_string()),
                ..SkinSymbol::default()
            })
            .with_polygon(PolygonSymbol {
                fill: Color::new(0.0, 0.0, 1.0, 1.0),
            });
        let filter = ExtrudeGeometryFilter::new(style);
        let resolved = filter.reset(Some(&sheet)).unwrap();

        assert_eq!(resolved.wall_color, Color::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(resolved.roof_color, Color::new(1.0, 0.0, 0.0, 1.0));
        // The roof style has no skin, so both channels use the filter's own
        assert!(resolved.wall_library.is_some());
        assert!(resolved.roof_library.is_some());
    }

    #[test]
    fn test_two_point_polygon_keeps_walls_only() {
        use extrude_lite_core::{Point3, SpatialReference};

        let job = ShapeJob {
            shape: Shape::polygon(vec![vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
            ]]),
            params: ExtrusionParams {
                make_base: true,
                ..ExtrusionParams::default()
            },
            name: None,
        };
        let localizer = Localizer::identity(SpatialReference::Projected);
        let out = build_shape(&job, &localizer, 60f64.to_radians()).unwrap();

        assert_eq!(out.walls.vertex_count(), 4);
        assert!(out.roof.is_none());
        assert!(out.base.is_none());
    }

    #[test]
    fn test_reset_requires_extrusion() {
        let filter = ExtrudeGeometryFilter::new(Style::new("flat"));
        assert!(filter.reset(None).is_none());
    }
}
