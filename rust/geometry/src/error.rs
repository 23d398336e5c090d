// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for extrusion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building extruded geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid extrusion options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error(transparent)]
    CoreError(#[from] extrude_lite_core::Error),
}
