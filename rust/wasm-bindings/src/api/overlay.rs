// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ground overlay handle for the renderer

use super::{resolve_ramp, ApiResult};
use crate::utils::console_debug;
use crate::zero_copy::ZeroCopyMesh;
use collage_core::{BBox, CoordinateProjector};
use collage_geometry::{GroundRasterOverlay, OverlayConfig};
use wasm_bindgen::prelude::*;

/// Scalar grid drawn as a texture on the ground
///
/// The texture's first row is the north edge. Upload it with `flipY = true`
/// so that row lands on the plane's `v = 1` edge.
///
/// Example:
/// ```javascript
/// const overlay = new GroundOverlayApi([13.40, 52.51, 13.41, 52.52]);
/// overlay.updateData(grid, gridWidth, gridHeight, "magma", 0, 45);
/// const [w, h] = overlay.textureSize();
/// const texture = new THREE.DataTexture(overlay.texels(), w, h);
/// ```
#[wasm_bindgen]
pub struct GroundOverlayApi {
    overlay: GroundRasterOverlay,
}

#[wasm_bindgen]
impl GroundOverlayApi {
    /// Create an overlay for `[west, south, east, north]`
    ///
    /// `configJson` may override `resolutionPxPerM`, `cellAlpha`, `opacity`,
    /// `elevationM` and `visible`.
    #[wasm_bindgen(constructor)]
    pub fn new(bbox: Vec<f64>, config_json: Option<String>) -> Result<GroundOverlayApi, JsError> {
        Ok(Self::create(&bbox, config_json.as_deref())?)
    }

    /// Repaint from a row-major grid, values mapped through a built-in ramp
    ///
    /// Without a domain the ramp is fitted to the grid's non-NaN values.
    #[wasm_bindgen(js_name = updateData)]
    pub fn update_data(
        &mut self,
        grid: &[f32],
        width: usize,
        height: usize,
        ramp: &str,
        domain_min: Option<f64>,
        domain_max: Option<f64>,
    ) -> Result<(), JsError> {
        self.repaint(grid, width, height, ramp, domain_min, domain_max)?;
        Ok(())
    }

    /// `[width, height]` of the texture in pixels
    #[wasm_bindgen(js_name = textureSize)]
    pub fn texture_size(&self) -> Vec<u32> {
        let (w, h) = self.overlay.texture_size();
        vec![w as u32, h as u32]
    }

    /// RGBA8 texels (copy to JS)
    pub fn texels(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.overlay.texels())
    }

    /// Pointer to the texels, for a zero-copy view
    #[wasm_bindgen(getter, js_name = texelsPtr)]
    pub fn texels_ptr(&self) -> *const u8 {
        self.overlay.texels().as_ptr()
    }

    #[wasm_bindgen(getter, js_name = texelsLen)]
    pub fn texels_len(&self) -> usize {
        self.overlay.texels().len()
    }

    /// Plane geometry with UVs, or undefined once disposed
    #[wasm_bindgen(js_name = planeMesh)]
    pub fn plane_mesh(&self) -> Option<ZeroCopyMesh> {
        self.overlay
            .plane()
            .map(|plane| ZeroCopyMesh::with_uvs(plane.mesh.clone(), plane.uvs.clone()))
    }

    /// Plane center `[x, y, z]` in a scene centered on `(originLng, originLat)`
    #[wasm_bindgen(js_name = planePosition)]
    pub fn plane_position(&self, origin_lng: f64, origin_lat: f64) -> Vec<f64> {
        let p = self
            .overlay
            .plane_position(&CoordinateProjector::new(origin_lng, origin_lat));
        vec![p.x, p.y, p.z]
    }

    #[wasm_bindgen(getter)]
    pub fn visible(&self) -> bool {
        self.overlay.is_visible()
    }

    #[wasm_bindgen(setter)]
    pub fn set_visible(&mut self, visible: bool) {
        self.overlay.set_visible(visible);
    }

    #[wasm_bindgen(getter)]
    pub fn opacity(&self) -> f32 {
        self.overlay.opacity()
    }

    #[wasm_bindgen(setter)]
    pub fn set_opacity(&mut self, opacity: f32) {
        self.overlay.set_opacity(opacity);
    }

    /// True when texels changed since the last `markUploaded`
    #[wasm_bindgen(getter, js_name = needsUpload)]
    pub fn needs_upload(&self) -> bool {
        self.overlay.needs_upload()
    }

    #[wasm_bindgen(js_name = markUploaded)]
    pub fn mark_uploaded(&mut self) {
        self.overlay.mark_uploaded();
    }

    /// Release the texture and plane. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.overlay.dispose();
    }

    #[wasm_bindgen(getter, js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.overlay.is_disposed()
    }
}

impl GroundOverlayApi {
    fn create(bbox: &[f64], config_json: Option<&str>) -> ApiResult<Self> {
        let bbox = BBox::try_from(bbox)?;
        let config = match config_json {
            Some(json) => serde_json::from_str::<OverlayConfig>(json)?,
            None => OverlayConfig::default(),
        };
        Ok(Self {
            overlay: GroundRasterOverlay::new(bbox, config),
        })
    }

    fn repaint(
        &mut self,
        grid: &[f32],
        width: usize,
        height: usize,
        ramp: &str,
        domain_min: Option<f64>,
        domain_max: Option<f64>,
    ) -> ApiResult<()> {
        let mut ramp = resolve_ramp(ramp, domain_min, domain_max)?;
        if domain_min.is_none() || domain_max.is_none() {
            let values = grid.iter().map(|&v| v as f64);
            if let Some((min, max)) = collage_core::value_range(values) {
                ramp = ramp.with_domain(min, max);
            }
        }

        self.overlay.update_data(grid, width, height, &ramp)?;
        let (w, h) = self.overlay.texture_size();
        console_debug!("overlay repainted: {}x{} grid into {}x{} texture", width, height, w, h);
        Ok(())
    }
}
