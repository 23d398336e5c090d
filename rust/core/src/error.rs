// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for feature and style operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building the feature/style model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    #[error("Invalid color literal: {0}")]
    InvalidColor(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Style sheet error: {0}")]
    StyleSheet(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for expression parse failures
    pub fn expression(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expr: expr.into(),
            reason: reason.into(),
        }
    }
}
