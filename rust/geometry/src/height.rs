// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-feature extrusion height and base offset

use extrude_lite_core::{
    ExtrusionSymbol, Feature, HeightReference, NumericExpression, MAX_Z_VARIABLE,
};
use std::sync::Arc;

/// Host-supplied height override, evaluated before any expression
pub trait HeightCallback: Send + Sync {
    fn height(&self, feature: &Feature) -> f64;
}

impl<F> HeightCallback for F
where
    F: Fn(&Feature) -> f64 + Send + Sync,
{
    fn height(&self, feature: &Feature) -> f64 {
        self(feature)
    }
}

/// Resolves extrusion height and offset for each feature
#[derive(Clone)]
pub struct HeightResolver {
    callback: Option<Arc<dyn HeightCallback>>,
    height_expr: Option<NumericExpression>,
    fixed_height: f64,
    offset_expr: Option<NumericExpression>,
}

impl HeightResolver {
    pub fn new(symbol: &ExtrusionSymbol, callback: Option<Arc<dyn HeightCallback>>) -> Self {
        // Measuring from sea level means every vertex extrudes to the same
        // absolute top, anchored at the feature's highest point
        let offset_expr = match symbol.height_reference {
            HeightReference::Msl => Some(NumericExpression::variable(MAX_Z_VARIABLE)),
            HeightReference::Z => None,
        };
        Self {
            callback,
            height_expr: symbol.height_expression.clone(),
            fixed_height: symbol.height,
            offset_expr,
        }
    }

    /// Callback, then expression, then the fixed height
    pub fn height(&self, feature: &Feature) -> f64 {
        if let Some(callback) = &self.callback {
            callback.height(feature)
        } else if let Some(expr) = &self.height_expr {
            feature.eval(expr)
        } else {
            self.fixed_height
        }
    }

    /// Amount subtracted from the height and flattened roof elevation
    pub fn offset(&self, feature: &Feature) -> f64 {
        self.offset_expr
            .as_ref()
            .map_or(0.0, |expr| feature.eval(expr))
    }

    pub fn offset_expression(&self) -> Option<&NumericExpression> {
        self.offset_expr.as_ref()
    }
}

impl std::fmt::Debug for HeightResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightResolver")
            .field("callback", &self.callback.is_some())
            .field("height_expr", &self.height_expr)
            .field("fixed_height", &self.fixed_height)
            .field("offset_expr", &self.offset_expr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrude_lite_core::{Geometry, Polygon};
    use nalgebra::Point3;

    fn feature() -> Feature {
        Feature::new(
            7,
            Geometry::Polygon(Polygon::new(vec![
                Point3::new(0.0, 0.0, 120.0),
                Point3::new(10.0, 0.0, 125.0),
                Point3::new(10.0, 10.0, 122.0),
            ])),
        )
        .with_attribute("levels", 4i64)
    }

    #[test]
    fn test_fixed_height() {
        let resolver = HeightResolver::new(&ExtrusionSymbol::default(), None);
        assert_eq!(resolver.height(&feature()), 10.0);
        assert_eq!(resolver.offset(&feature()), 0.0);
    }

    #[test]
    fn test_expression_over_fixed() {
        let symbol = ExtrusionSymbol {
            height_expression: Some(NumericExpression::parse("[levels] * 3").unwrap()),
            ..ExtrusionSymbol::default()
        };
        let resolver = HeightResolver::new(&symbol, None);
        assert_eq!(resolver.height(&feature()), 12.0);
    }

    #[test]
    fn test_callback_over_expression() {
        let symbol = ExtrusionSymbol {
            height_expression: Some(NumericExpression::parse("[levels] * 3").unwrap()),
            ..ExtrusionSymbol::default()
        };
        let callback: Arc<dyn HeightCallback> = Arc::new(|f: &Feature| f.id as f64);
        let resolver = HeightResolver::new(&symbol, Some(callback));
        assert_eq!(resolver.height(&feature()), 7.0);
    }

    #[test]
    fn test_msl_offset_is_max_z() {
        let symbol = ExtrusionSymbol {
            height_reference: HeightReference::Msl,
            ..ExtrusionSymbol::default()
        };
        let resolver = HeightResolver::new(&symbol, None);
        assert_eq!(resolver.offset_expression().map(|e| e.source()), Some("[__max_z]"));
        assert_eq!(resolver.offset(&feature()), 125.0);
    }
}
