// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Features: geometry plus attributes

use crate::expression::{NumericExpression, StringExpression};
use crate::geometry::Geometry;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Reserved variable resolving to the maximum Z across a feature's geometry
pub const MAX_Z_VARIABLE: &str = "__max_z";

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view; strings are parsed, booleans map to 0/1
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Double(d) => d.to_string(),
            Self::String(s) => s.clone(),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// A geometry with attributes
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub id: u64,
    pub geometry: Option<Geometry>,
    pub attributes: FxHashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(id: u64, geometry: Geometry) -> Self {
        Self {
            id,
            geometry: Some(geometry),
            attributes: FxHashMap::default(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Numeric attribute, `None` when missing or not numeric
    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_float)
    }

    /// Resolve an expression variable: attributes first, then reserved names.
    /// Unresolvable variables evaluate to `0.0`.
    fn variable(&self, name: &str) -> f64 {
        if let Some(v) = self.get_double(name) {
            return v;
        }
        if name == MAX_Z_VARIABLE {
            return self
                .geometry
                .as_ref()
                .and_then(Geometry::max_z)
                .unwrap_or(0.0);
        }
        if name == "id" {
            return self.id as f64;
        }
        tracing::trace!(feature = self.id, variable = name, "Unresolved expression variable");
        0.0
    }

    /// Evaluate a numeric expression against this feature
    pub fn eval(&self, expr: &NumericExpression) -> f64 {
        expr.eval(|name| self.variable(name))
    }

    /// Evaluate a string expression against this feature
    pub fn eval_string(&self, expr: &StringExpression) -> String {
        expr.eval(|name| match self.get(name) {
            Some(value) => value.as_string(),
            None if name == "id" => self.id.to_string(),
            None => String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use nalgebra::Point3;

    fn footprint() -> Geometry {
        Geometry::Polygon(Polygon::new(vec![
            Point3::new(0.0, 0.0, 100.0),
            Point3::new(10.0, 0.0, 102.5),
            Point3::new(10.0, 10.0, 101.0),
        ]))
    }

    #[test]
    fn test_eval_attribute_expression() {
        let feature = Feature::new(1, footprint()).with_attribute("levels", 3i64);
        let expr = NumericExpression::parse("[levels] * 3").unwrap();
        assert_eq!(feature.eval(&expr), 9.0);
    }

    #[test]
    fn test_string_attribute_coerces() {
        let feature = Feature::new(1, footprint()).with_attribute("height", " 12.5 ");
        assert_eq!(feature.get_double("height"), Some(12.5));
    }

    #[test]
    fn test_missing_attribute_is_zero() {
        let feature = Feature::new(1, footprint());
        let expr = NumericExpression::parse("[height] + 1").unwrap();
        assert_eq!(feature.eval(&expr), 1.0);
    }

    #[test]
    fn test_max_z_variable() {
        let feature = Feature::new(1, footprint());
        let expr = NumericExpression::variable(MAX_Z_VARIABLE);
        assert_eq!(feature.eval(&expr), 102.5);
    }

    #[test]
    fn test_eval_string() {
        let feature = Feature::new(7, footprint()).with_attribute("name", "Depot");
        let expr = StringExpression::new("[name]-[id]");
        assert_eq!(feature.eval_string(&expr), "Depot-7");
    }
}
