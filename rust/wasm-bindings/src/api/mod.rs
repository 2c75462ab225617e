// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for Collage
//!
//! Stateful handles for the building mesh and the ground overlay, plus free
//! functions for color ramps and projection.

mod buildings;
mod overlay;
mod ramps;

pub use buildings::BuildingMeshApi;
pub use overlay::GroundOverlayApi;

use collage_core::{ColorRamp, MetricValues, RampName};
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Errors raised while decoding JavaScript input
///
/// Converted to a `JsError` at the boundary by `?`.
#[derive(Error, Debug)]
pub(crate) enum ApiError {
    #[error("{0}")]
    Core(#[from] collage_core::Error),

    #[error("{0}")]
    Geometry(#[from] collage_geometry::Error),

    #[error("Invalid input: {0}")]
    Input(#[from] serde_wasm_bindgen::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) type ApiResult<T> = std::result::Result<T, ApiError>;

/// Resolve a built-in ramp by name, optionally with an explicit domain
///
/// A domain with a non-finite bound keeps the ramp's default `[0, 1]`.
pub(crate) fn resolve_ramp(name: &str, domain_min: Option<f64>, domain_max: Option<f64>) -> ApiResult<ColorRamp> {
    let ramp = ColorRamp::by_name(name)?;
    Ok(match (domain_min, domain_max) {
        (Some(min), Some(max)) if min.is_finite() && max.is_finite() => ramp.with_domain(min, max),
        _ => ramp,
    })
}

/// Decode a `{ id: number | null }` object into metric values
pub(crate) fn metric_values(values: JsValue) -> ApiResult<MetricValues> {
    Ok(serde_wasm_bindgen::from_value(values)?)
}

/// Names of the built-in ramps
#[wasm_bindgen(js_name = rampNames)]
pub fn ramp_names() -> Vec<String> {
    RampName::ALL.iter().map(|n| n.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ramp_domain() {
        let ramp = resolve_ramp("magma", Some(10.0), Some(20.0)).unwrap();
        assert_eq!(ramp.domain(), (10.0, 20.0));

        let ramp = resolve_ramp("Blues", Some(f64::NAN), Some(20.0)).unwrap();
        assert_eq!(ramp.domain(), (0.0, 1.0));

        assert!(resolve_ramp("jet", None, None).is_err());
    }

    #[test]
    fn test_ramp_names() {
        let names = ramp_names();
        assert_eq!(names.len(), 5);
        assert!(names.iter().any(|n| n == "viridis"));
    }
}
