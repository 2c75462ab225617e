// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instanced unit boxes
//!
//! One shared box geometry plus a per-instance transform, color and entity id.
//! Instance indices are dense and assigned in build order, so the id table is a
//! plain `Vec`; the reverse map only serves id-based lookups such as highlighting.

use crate::extrusion::extrude_profile;
use crate::mesh::Mesh;
use crate::profile::create_rectangle;
use crate::Result;
use collage_core::Color;
use nalgebra::{Matrix4, Vector3};
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Axis-aligned unit cube centered on the origin, in the y-up frame
pub fn unit_box() -> Result<Mesh> {
    let mut mesh = extrude_profile(&create_rectangle(1.0, 1.0), 1.0, None)?;
    mesh.translate(Vector3::new(0.0, 0.0, -0.5));
    mesh.to_y_up();
    Ok(mesh)
}

/// Per-instance placement of the unit box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    /// Box center in the y-up frame
    pub position: Vector3<f64>,
    /// Box extents (width, height, depth)
    pub scale: Vector3<f64>,
}

impl InstanceTransform {
    pub fn new(position: Vector3<f64>, scale: Vector3<f64>) -> Self {
        Self { position, scale }
    }

    /// Scale then translate
    pub fn matrix(&self) -> Matrix4<f32> {
        let m = Matrix4::new_translation(&self.position)
            * Matrix4::new_nonuniform_scaling(&self.scale);
        m.cast::<f32>()
    }
}

/// Unit-box instances with colors and entity identity
#[derive(Debug, Clone)]
pub struct InstancedMesh {
    geometry: Mesh,
    transforms: Vec<InstanceTransform>,
    colors: Vec<f32>,
    entity_ids: Vec<String>,
    index_by_id: FxHashMap<String, usize>,
    matrices_dirty: bool,
    colors_dirty: bool,
}

impl InstancedMesh {
    /// Empty instance table sharing `geometry`
    pub fn new(geometry: Mesh, capacity: usize) -> Self {
        let mut index_by_id = FxHashMap::default();
        index_by_id.reserve(capacity);
        Self {
            geometry,
            transforms: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity * 3),
            entity_ids: Vec::with_capacity(capacity),
            index_by_id,
            matrices_dirty: true,
            colors_dirty: true,
        }
    }

    /// Append an instance and return its index
    ///
    /// A repeated id still gets its own instance, but id lookups keep resolving to
    /// the first one.
    pub fn push(&mut self, entity_id: &str, transform: InstanceTransform, color: Color) -> usize {
        let index = self.transforms.len();
        self.transforms.push(transform);
        self.colors.extend_from_slice(&color.to_array());
        self.entity_ids.push(entity_id.to_string());
        self.index_by_id.entry(entity_id.to_string()).or_insert(index);
        self.matrices_dirty = true;
        self.colors_dirty = true;
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Shared box geometry
    #[inline]
    pub fn geometry(&self) -> &Mesh {
        &self.geometry
    }

    #[inline]
    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    #[inline]
    pub fn transform(&self, index: usize) -> Option<&InstanceTransform> {
        self.transforms.get(index)
    }

    /// Column-major 4x4 matrices, 16 floats per instance
    pub fn matrices(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.transforms.len() * 16);
        for transform in &self.transforms {
            out.extend_from_slice(transform.matrix().as_slice());
        }
        out
    }

    /// Instance centers, 3 floats per instance
    pub fn positions(&self) -> Vec<f32> {
        self.transforms
            .iter()
            .flat_map(|t| [t.position.x as f32, t.position.y as f32, t.position.z as f32])
            .collect()
    }

    /// Instance extents, 3 floats per instance
    pub fn scales(&self) -> Vec<f32> {
        self.transforms
            .iter()
            .flat_map(|t| [t.scale.x as f32, t.scale.y as f32, t.scale.z as f32])
            .collect()
    }

    /// RGB colors, 3 floats per instance
    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn color(&self, index: usize) -> Option<Color> {
        let rgb = self.colors.get(color_range(index)?)?;
        Some(Color::rgb(rgb[0], rgb[1], rgb[2]))
    }

    /// Set one instance color; false if `index` is out of range
    pub fn set_color(&mut self, index: usize, color: Color) -> bool {
        match color_range(index).and_then(|range| self.colors.get_mut(range)) {
            Some(rgb) => {
                rgb.copy_from_slice(&color.to_array());
                self.colors_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Set every instance to the same color
    pub fn fill_color(&mut self, color: Color) {
        let rgb = color.to_array();
        for chunk in self.colors.chunks_exact_mut(3) {
            chunk.copy_from_slice(&rgb);
        }
        self.colors_dirty = true;
    }

    /// Entity id of an instance
    #[inline]
    pub fn entity_id(&self, index: usize) -> Option<&str> {
        self.entity_ids.get(index).map(String::as_str)
    }

    /// Entity ids in instance order
    #[inline]
    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    /// First instance built for `entity_id`
    #[inline]
    pub fn index_of(&self, entity_id: &str) -> Option<usize> {
        self.index_by_id.get(entity_id).copied()
    }

    #[inline]
    pub fn matrices_need_update(&self) -> bool {
        self.matrices_dirty
    }

    #[inline]
    pub fn colors_need_update(&self) -> bool {
        self.colors_dirty
    }

    /// Clear both dirty flags after the host has uploaded the buffers
    pub fn mark_uploaded(&mut self) {
        self.matrices_dirty = false;
        self.colors_dirty = false;
    }
}

#[inline]
fn color_range(index: usize) -> Option<Range<usize>> {
    let start = index.checked_mul(3)?;
    Some(start..start.checked_add(3)?)
}
