// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zero-copy mesh data structures for WASM
//!
//! Enables direct access to WASM memory from JavaScript without copying.

use collage_geometry::Mesh;
use wasm_bindgen::prelude::*;

/// Mesh buffers that JavaScript can view in place
///
/// ```javascript
/// const mesh = api.boxGeometry();
/// const memory = getMemory();
/// const positions = new Float32Array(memory.buffer, mesh.positionsPtr, mesh.positionsLen);
/// ```
///
/// Views are invalidated when WASM memory grows; recreate them after any call
/// that may allocate.
#[wasm_bindgen]
pub struct ZeroCopyMesh {
    mesh: Mesh,
    uvs: Vec<f32>,
}

#[wasm_bindgen]
impl ZeroCopyMesh {
    /// Get pointer to positions array
    #[wasm_bindgen(getter, js_name = positionsPtr)]
    pub fn positions_ptr(&self) -> *const f32 {
        self.mesh.positions.as_ptr()
    }

    /// Get length of positions array (in f32 elements, not bytes)
    #[wasm_bindgen(getter, js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.mesh.positions.len()
    }

    #[wasm_bindgen(getter, js_name = normalsPtr)]
    pub fn normals_ptr(&self) -> *const f32 {
        self.mesh.normals.as_ptr()
    }

    #[wasm_bindgen(getter, js_name = normalsLen)]
    pub fn normals_len(&self) -> usize {
        self.mesh.normals.len()
    }

    #[wasm_bindgen(getter, js_name = indicesPtr)]
    pub fn indices_ptr(&self) -> *const u32 {
        self.mesh.indices.as_ptr()
    }

    #[wasm_bindgen(getter, js_name = indicesLen)]
    pub fn indices_len(&self) -> usize {
        self.mesh.indices.len()
    }

    /// Texture coordinates pointer (empty for meshes without UVs)
    #[wasm_bindgen(getter, js_name = uvsPtr)]
    pub fn uvs_ptr(&self) -> *const f32 {
        self.uvs.as_ptr()
    }

    #[wasm_bindgen(getter, js_name = uvsLen)]
    pub fn uvs_len(&self) -> usize {
        self.uvs.len()
    }

    /// Get positions as Float32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.mesh.positions[..])
    }

    /// Get normals as Float32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn normals(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.mesh.normals[..])
    }

    /// Get indices as Uint32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(&self.mesh.indices[..])
    }

    #[wasm_bindgen(getter)]
    pub fn uvs(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.uvs[..])
    }

    #[wasm_bindgen(getter, js_name = vertexCount)]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[wasm_bindgen(getter, js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    #[wasm_bindgen(getter, js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// Bounding box as `[minX, minY, minZ, maxX, maxY, maxZ]`
    #[wasm_bindgen]
    pub fn bounds(&self) -> Vec<f32> {
        let (min, max) = self.mesh.bounds();
        vec![min.x, min.y, min.z, max.x, max.y, max.z]
    }
}

impl ZeroCopyMesh {
    /// Mesh with per-vertex UVs
    pub fn with_uvs(mesh: Mesh, uvs: Vec<f32>) -> Self {
        Self { mesh, uvs }
    }
}

impl From<Mesh> for ZeroCopyMesh {
    fn from(mesh: Mesh) -> Self {
        Self::with_uvs(mesh, Vec::new())
    }
}

/// Get WASM memory to allow JavaScript to create TypedArray views
#[wasm_bindgen(js_name = getMemory)]
pub fn get_memory() -> JsValue {
    wasm_bindgen::memory()
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_geometry::unit_box;

    #[test]
    fn test_zero_copy_lengths() {
        let mesh = ZeroCopyMesh::from(unit_box().unwrap());
        assert_eq!(mesh.positions_len(), 72);
        assert_eq!(mesh.normals_len(), 72);
        assert_eq!(mesh.indices_len(), 36);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.uvs_len(), 0);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_zero_copy_pointers() {
        let mesh = ZeroCopyMesh::from(Mesh::new());

        // Pointers should be valid even for empty mesh
        assert!(!mesh.positions_ptr().is_null());
        assert!(!mesh.normals_ptr().is_null());
        assert!(!mesh.indices_ptr().is_null());
        assert!(!mesh.uvs_ptr().is_null());
    }
}
