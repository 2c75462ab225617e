// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for data model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or validating input data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid color ramp: {0}")]
    InvalidRamp(String),

    #[error("Unknown color ramp: {0}")]
    UnknownRamp(String),

    #[error("Grid data has {actual} cells, expected {expected}")]
    GridSize { expected: usize, actual: usize },

    #[error("Invalid bounding box: {0}")]
    InvalidBBox(String),
}
