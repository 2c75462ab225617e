// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building mesh handle for the renderer

use super::{metric_values, resolve_ramp, ApiResult};
use crate::utils::{console_debug, console_warn};
use crate::zero_copy::ZeroCopyMesh;
use collage_core::{enrich_heights, BuildingEntity, BuildingFeature, Color};
use collage_geometry::{
    unit_box, BuildReport, BuildingMeshSynthesizer, RenderMode, SynthesisConfig,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// One element of the input array: a GeoJSON feature or a flat entity
#[derive(Deserialize)]
#[serde(untagged)]
enum EntityInput {
    Feature(BuildingFeature),
    Entity(BuildingEntity),
}

impl From<EntityInput> for BuildingEntity {
    fn from(input: EntityInput) -> Self {
        match input {
            EntityInput::Feature(feature) => feature.into(),
            EntityInput::Entity(entity) => entity,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SkippedJs {
    index: usize,
    id: String,
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildReportJs {
    mode: RenderMode,
    requested: usize,
    built: usize,
    skipped: Vec<SkippedJs>,
}

impl From<BuildReport> for BuildReportJs {
    fn from(report: BuildReport) -> Self {
        Self {
            mode: report.mode,
            requested: report.requested,
            built: report.built,
            skipped: report
                .skipped
                .into_iter()
                .map(|s| SkippedJs {
                    index: s.index,
                    id: s.id,
                    reason: s.reason,
                })
                .collect(),
        }
    }
}

/// Building mesh for one scene origin
///
/// Example:
/// ```javascript
/// const api = new BuildingMeshApi(13.405, 52.52);
/// const report = api.setEntities(features, "context", true);
/// const mesh = new THREE.InstancedMesh(boxGeometry, material, api.instanceCount);
/// mesh.instanceMatrix.array.set(api.instanceMatrices());
/// api.colorByRamp({ "way/1": 12.5, "way/2": null }, "viridis", 0, 40);
/// ```
#[wasm_bindgen]
pub struct BuildingMeshApi {
    synth: BuildingMeshSynthesizer,
}

#[wasm_bindgen]
impl BuildingMeshApi {
    /// Create a handle centered on `(originLng, originLat)`
    ///
    /// `configJson` may override any of `defaultHeightM`, `minFootprintM`,
    /// `baseColor`, `highlightColor` and `opacity`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        origin_lng: f64,
        origin_lat: f64,
        config_json: Option<String>,
    ) -> Result<BuildingMeshApi, JsError> {
        Ok(Self::create(origin_lng, origin_lat, config_json.as_deref())?)
    }

    /// Replace the mesh with one built from `entities`
    ///
    /// `entities` is an array of GeoJSON building features or flat entity
    /// objects; `mode` is `"context"` or `"focal"`. Returns the build report.
    #[wasm_bindgen(js_name = setEntities)]
    pub fn set_entities(
        &mut self,
        entities: JsValue,
        mode: &str,
        apply_height_cascade: bool,
    ) -> Result<JsValue, JsError> {
        let mode: RenderMode = mode.parse()?;
        let inputs: Vec<EntityInput> = serde_wasm_bindgen::from_value(entities)?;
        let mut entities: Vec<BuildingEntity> = inputs.into_iter().map(Into::into).collect();

        if apply_height_cascade {
            let stats = enrich_heights(&mut entities);
            console_debug!(
                "height cascade: {} from levels, {} defaulted",
                stats.from_levels,
                stats.defaulted
            );
        }

        let report = self.synth.set_entities(&entities, mode);
        if !report.is_complete() {
            console_warn!(
                "{} of {} buildings produced no geometry",
                report.skipped_count(),
                report.requested
            );
        }

        Ok(serde_wasm_bindgen::to_value(&BuildReportJs::from(report))?)
    }

    /// Current mode, or undefined before the first build
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> Option<String> {
        self.synth.mode().map(|m| m.as_str().to_string())
    }

    /// Shared unit box geometry for context mode
    #[wasm_bindgen(js_name = boxGeometry)]
    pub fn box_geometry(&self) -> Result<ZeroCopyMesh, JsError> {
        Ok(match self.synth.instanced() {
            Some(instances) => instances.geometry().clone().into(),
            None => unit_box()?.into(),
        })
    }

    /// Merged focal-mode buffers, or undefined in context mode
    #[wasm_bindgen(js_name = mergedMesh)]
    pub fn merged_mesh(&self) -> Option<ZeroCopyMesh> {
        self.synth.merged().cloned().map(Into::into)
    }

    #[wasm_bindgen(getter, js_name = instanceCount)]
    pub fn instance_count(&self) -> usize {
        self.synth.instanced().map_or(0, |i| i.len())
    }

    /// Column-major instance matrices, 16 floats each
    #[wasm_bindgen(js_name = instanceMatrices)]
    pub fn instance_matrices(&self) -> js_sys::Float32Array {
        let matrices = self.synth.instanced().map(|i| i.matrices()).unwrap_or_default();
        js_sys::Float32Array::from(&matrices[..])
    }

    /// Instance RGB colors, 3 floats each
    #[wasm_bindgen(js_name = instanceColors)]
    pub fn instance_colors(&self) -> js_sys::Float32Array {
        let colors = self.synth.instanced().map(|i| i.colors()).unwrap_or(&[]);
        js_sys::Float32Array::from(colors)
    }

    /// Pointer to the instance colors, for a zero-copy view
    #[wasm_bindgen(getter, js_name = instanceColorsPtr)]
    pub fn instance_colors_ptr(&self) -> *const f32 {
        self.synth
            .instanced()
            .map_or(std::ptr::null(), |i| i.colors().as_ptr())
    }

    #[wasm_bindgen(getter, js_name = instanceColorsLen)]
    pub fn instance_colors_len(&self) -> usize {
        self.synth.instanced().map_or(0, |i| i.colors().len())
    }

    /// True when instance colors changed since the last `markUploaded`
    #[wasm_bindgen(getter, js_name = colorsNeedUpdate)]
    pub fn colors_need_update(&self) -> bool {
        self.synth
            .instanced()
            .is_some_and(|i| i.colors_need_update())
    }

    #[wasm_bindgen(getter, js_name = matricesNeedUpdate)]
    pub fn matrices_need_update(&self) -> bool {
        self.synth
            .instanced()
            .is_some_and(|i| i.matrices_need_update())
    }

    #[wasm_bindgen(js_name = markUploaded)]
    pub fn mark_uploaded(&mut self) {
        if let Some(instances) = self.synth.instanced_mut() {
            instances.mark_uploaded();
        }
    }

    /// Color instances through a built-in ramp
    ///
    /// `values` maps entity ids to numbers or null. Without a domain the ramp is
    /// fitted to the finite values. Returns false outside context mode.
    #[wasm_bindgen(js_name = colorByRamp)]
    pub fn color_by_ramp(
        &mut self,
        values: JsValue,
        ramp: &str,
        domain_min: Option<f64>,
        domain_max: Option<f64>,
    ) -> Result<bool, JsError> {
        let values = metric_values(values)?;
        let mut ramp = resolve_ramp(ramp, domain_min, domain_max)?;
        if domain_min.is_none() || domain_max.is_none() {
            ramp = ramp.fit_domain(values.values());
        }
        Ok(self.synth.color_by_ramp(&values, &ramp))
    }

    /// Highlight one entity, or clear the highlight with undefined
    #[wasm_bindgen(js_name = highlightEntity)]
    pub fn highlight_entity(&mut self, entity_id: Option<String>) -> bool {
        self.synth.highlight_entity(entity_id.as_deref())
    }

    /// Entity id behind a picked instance
    #[wasm_bindgen(js_name = entityIdAtInstance)]
    pub fn entity_id_at_instance(&self, index: usize) -> Option<String> {
        self.synth.entity_id_at_instance(index).map(str::to_string)
    }

    /// Instance index of an entity id
    #[wasm_bindgen(js_name = instanceOfEntity)]
    pub fn instance_of_entity(&self, entity_id: &str) -> Option<usize> {
        self.synth.instance_of_entity(entity_id)
    }

    /// Material color as `#rrggbb`
    #[wasm_bindgen(getter, js_name = baseColor)]
    pub fn base_color(&self) -> String {
        self.synth.config().base_color.to_hex()
    }

    #[wasm_bindgen(getter)]
    pub fn opacity(&self) -> f32 {
        self.synth.opacity()
    }

    #[wasm_bindgen(setter)]
    pub fn set_opacity(&mut self, opacity: f32) {
        self.synth.set_opacity(opacity);
    }

    /// Release all buffers. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.synth.dispose();
    }

    #[wasm_bindgen(getter, js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.synth.is_disposed()
    }
}

impl BuildingMeshApi {
    fn create(origin_lng: f64, origin_lat: f64, config_json: Option<&str>) -> ApiResult<Self> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<SynthesisConfig>(json)?,
            None => SynthesisConfig::default(),
        };
        let projector = collage_core::CoordinateProjector::new(origin_lng, origin_lat);
        Ok(Self {
            synth: BuildingMeshSynthesizer::new(projector, config),
        })
    }

    /// Highlight color, for hosts that tint picked instances themselves
    pub fn highlight_color(&self) -> Color {
        self.synth.config().highlight_color
    }
}
