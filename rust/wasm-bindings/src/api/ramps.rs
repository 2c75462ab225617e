// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color ramp and projection helpers

use super::{metric_values, resolve_ramp, ApiResult};
use collage_core::{bbox_area_m2, colorize, wgs84_to_local, BBox, ColorRamp};
use rustc_hash::FxHashMap;
use wasm_bindgen::prelude::*;

/// Color at `t` in `[0, 1]` along a built-in ramp, as `#rrggbb`
#[wasm_bindgen(js_name = interpolateRamp)]
pub fn interpolate_ramp(ramp: &str, t: f64) -> Result<String, JsError> {
    Ok(ColorRamp::by_name(ramp)?.interpolate(t).to_hex())
}

/// Map `{ id: number | null }` to `{ id: "#rrggbb" }` through a built-in ramp
///
/// Without a domain the ramp is fitted to the finite values.
#[wasm_bindgen(js_name = colorizeValues)]
pub fn colorize_values(
    values: JsValue,
    ramp: &str,
    domain_min: Option<f64>,
    domain_max: Option<f64>,
) -> Result<JsValue, JsError> {
    let colors = colorize_hex(values, ramp, domain_min, domain_max)?;
    Ok(serde_wasm_bindgen::to_value(&colors)?)
}

/// Ramp definition as JSON (`name`, `stops`, `domain`, `nullColor`)
#[wasm_bindgen(js_name = rampDefinition)]
pub fn ramp_definition(ramp: &str) -> Result<String, JsError> {
    let ramp = ColorRamp::by_name(ramp)?;
    Ok(serde_json::to_string(&ramp)?)
}

/// Project `(lng, lat)` to local metres `[x, y]` around an origin (z-up frame)
#[wasm_bindgen(js_name = projectToLocal)]
pub fn project_to_local(lng: f64, lat: f64, origin_lng: f64, origin_lat: f64) -> Vec<f64> {
    let p = wgs84_to_local(lng, lat, origin_lng, origin_lat);
    vec![p.x, p.y]
}

/// Approximate area of `[west, south, east, north]` in square metres
#[wasm_bindgen(js_name = bboxAreaM2)]
pub fn bbox_area(bbox: Vec<f64>) -> Result<f64, JsError> {
    let bbox = BBox::try_from(&bbox[..])?;
    Ok(bbox_area_m2(&bbox))
}

fn colorize_hex(
    values: JsValue,
    ramp: &str,
    domain_min: Option<f64>,
    domain_max: Option<f64>,
) -> ApiResult<FxHashMap<String, String>> {
    let values = metric_values(values)?;
    let mut ramp = resolve_ramp(ramp, domain_min, domain_max)?;
    if domain_min.is_none() || domain_max.is_none() {
        ramp = ramp.fit_domain(values.values());
    }
    Ok(colorize(&values, &ramp)
        .into_iter()
        .map(|(id, color)| (id, color.to_hex()))
        .collect())
}
