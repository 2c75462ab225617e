// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ground raster overlay
//!
//! A semi-transparent RGBA8 texture on a horizontal quad covering a geographic
//! bbox. Texture row 0 is the north edge; column 0 is the west edge.

use crate::config::OverlayConfig;
use crate::mesh::Mesh;
use crate::Result;
use collage_core::{
    bbox_center, bbox_size_m, BBox, ColorRamp, CoordinateProjector, Error as CoreError, ScalarGrid,
};
use nalgebra::{Point3, Vector3};

/// Horizontal quad the overlay texture is drawn on, centered on its own origin
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPlane {
    pub mesh: Mesh,
    /// Texture coordinates (u, v) per vertex; v = 1 on the north edge
    pub uvs: Vec<f32>,
    /// East-west extent (m)
    pub width_m: f64,
    /// North-south extent (m)
    pub depth_m: f64,
}

impl GroundPlane {
    /// Quad of the given size in the y-up horizontal plane, facing +Y
    pub fn new(width_m: f64, depth_m: f64) -> Self {
        let (hw, hd) = (width_m / 2.0, depth_m / 2.0);
        let up = Vector3::new(0.0, 1.0, 0.0);

        let mut mesh = Mesh::with_capacity(4, 6);
        // SW, SE, NE, NW (north is -Z)
        mesh.add_vertex(Point3::new(-hw, 0.0, hd), up);
        mesh.add_vertex(Point3::new(hw, 0.0, hd), up);
        mesh.add_vertex(Point3::new(hw, 0.0, -hd), up);
        mesh.add_vertex(Point3::new(-hw, 0.0, -hd), up);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);

        Self {
            mesh,
            uvs: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            width_m,
            depth_m,
        }
    }
}

/// Scalar field drawn as a colored texture on the ground
#[derive(Debug, Clone)]
pub struct GroundRasterOverlay {
    bbox: BBox,
    config: OverlayConfig,
    texture_width: usize,
    texture_height: usize,
    texels: Vec<u8>,
    plane: Option<GroundPlane>,
    visible: bool,
    opacity: f32,
    texture_dirty: bool,
}

impl GroundRasterOverlay {
    /// Size the texture from the bbox's metric extent times the resolution
    ///
    /// Degenerate extents still get a 1x1 texture.
    pub fn new(bbox: BBox, config: OverlayConfig) -> Self {
        let (dx, dy) = bbox_size_m(&bbox);
        let (width_m, depth_m) = (dx.abs(), dy.abs());
        let texture_width = texture_extent(width_m, config.resolution_px_per_m);
        let texture_height = texture_extent(depth_m, config.resolution_px_per_m);

        tracing::debug!(
            width = texture_width,
            height = texture_height,
            width_m,
            depth_m,
            "ground overlay allocated"
        );

        Self {
            bbox,
            texture_width,
            texture_height,
            texels: vec![0; texture_width * texture_height * 4],
            plane: Some(GroundPlane::new(width_m, depth_m)),
            visible: config.visible,
            opacity: config.opacity,
            texture_dirty: true,
            config,
        }
    }

    /// Overlay with default settings and the given pixels per metre
    pub fn with_resolution(bbox: BBox, resolution_px_per_m: f64) -> Self {
        Self::new(
            bbox,
            OverlayConfig {
                resolution_px_per_m,
                ..OverlayConfig::default()
            },
        )
    }

    #[inline]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    #[inline]
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Texture size in pixels `(width, height)`
    #[inline]
    pub fn texture_size(&self) -> (usize, usize) {
        (self.texture_width, self.texture_height)
    }

    /// RGBA8 texels, row-major, row 0 = north
    #[inline]
    pub fn texels(&self) -> &[u8] {
        &self.texels
    }

    #[inline]
    pub fn plane(&self) -> Option<&GroundPlane> {
        self.plane.as_ref()
    }

    /// Where to place the plane's center in a scene projected with `projector`
    pub fn plane_position(&self, projector: &CoordinateProjector) -> Vector3<f64> {
        let (lng, lat) = bbox_center(&self.bbox);
        let center = projector.project(lng, lat);
        Vector3::new(center.x, self.config.elevation_m, -center.y)
    }

    /// Repaint the texture from a row-major grid of `width` x `height` values
    ///
    /// Cells outside the texture are ignored; texels outside the grid stay fully
    /// transparent. Values map through the ramp's domain (midpoint when the
    /// domain is collapsed). NaN cells get the ramp's null color with alpha 0.
    /// A no-op once disposed.
    pub fn update_data(
        &mut self,
        grid: &[f32],
        width: usize,
        height: usize,
        ramp: &ColorRamp,
    ) -> Result<()> {
        let expected = width
            .checked_mul(height)
            .ok_or(CoreError::GridSize { expected: usize::MAX, actual: grid.len() })?;
        if grid.len() < expected {
            return Err(CoreError::GridSize {
                expected,
                actual: grid.len(),
            }
            .into());
        }
        if self.plane.is_none() {
            return Ok(());
        }

        self.texels.fill(0);

        let alpha = self.config.cell_alpha;
        let null_rgb = ramp.null_color().to_rgb8();
        let rows = height.min(self.texture_height);
        let cols = width.min(self.texture_width);

        for y in 0..rows {
            let row = &grid[y * width..y * width + cols];
            let out = &mut self.texels[y * self.texture_width * 4..(y * self.texture_width + cols) * 4];

            for (value, texel) in row.iter().zip(out.chunks_exact_mut(4)) {
                if value.is_nan() {
                    texel[..3].copy_from_slice(&null_rgb);
                    texel[3] = 0;
                } else {
                    let color = ramp.interpolate(ramp.normalize(*value as f64));
                    texel[..3].copy_from_slice(&color.to_rgb8());
                    texel[3] = alpha;
                }
            }
        }

        self.texture_dirty = true;
        tracing::debug!(rows, cols, "ground overlay repainted");
        Ok(())
    }

    /// Repaint from a [`ScalarGrid`]
    pub fn update_grid(&mut self, grid: &ScalarGrid, ramp: &ColorRamp) -> Result<()> {
        self.update_data(grid.data(), grid.width(), grid.height(), ramp)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Material opacity, clamped to `[0, 1]`
    pub fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Texels changed since the last [`mark_uploaded`](Self::mark_uploaded)
    #[inline]
    pub fn needs_upload(&self) -> bool {
        self.texture_dirty
    }

    pub fn mark_uploaded(&mut self) {
        self.texture_dirty = false;
    }

    /// Release the texture and plane geometry. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.plane.take().is_some() {
            tracing::debug!("ground overlay released");
        }
        self.texels = Vec::new();
        self.texture_dirty = false;
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.plane.is_none()
    }
}

#[inline]
fn texture_extent(meters: f64, resolution: f64) -> usize {
    // NaN and negative products saturate to 0
    ((meters * resolution).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use collage_core::{degrees_to_meters, RampName};

    /// Bbox of about `w` x `h` metres at the equator
    fn bbox_m(w: f64, h: f64) -> BBox {
        let (per_deg, _) = degrees_to_meters(1.0, 0.0, 0.0);
        BBox::new(0.0, 0.0, w / per_deg, h / per_deg)
    }

    fn texel(overlay: &GroundRasterOverlay, x: usize, y: usize) -> &[u8] {
        let (w, _) = overlay.texture_size();
        let i = (y * w + x) * 4;
        &overlay.texels()[i..i + 4]
    }

    #[test]
    fn test_texture_size_from_resolution() {
        let overlay = GroundRasterOverlay::with_resolution(bbox_m(99.5, 49.5), 0.5);
        assert_eq!(overlay.texture_size(), (50, 25));
        assert_eq!(overlay.texels().len(), 50 * 25 * 4);

        let plane = overlay.plane().unwrap();
        assert_relative_eq!(plane.width_m, 99.5, max_relative = 1e-9);
        assert_relative_eq!(plane.depth_m, 49.5, max_relative = 1e-9);
    }

    #[test]
    fn test_degenerate_bbox_gets_one_pixel() {
        let overlay = GroundRasterOverlay::new(BBox::new(1.0, 1.0, 1.0, 1.0), OverlayConfig::default());
        assert_eq!(overlay.texture_size(), (1, 1));

        let overlay = GroundRasterOverlay::with_resolution(bbox_m(100.0, 100.0), f64::NAN);
        assert_eq!(overlay.texture_size(), (1, 1));
    }

    #[test]
    fn test_update_data_colors_and_alpha() {
        let mut overlay = GroundRasterOverlay::with_resolution(bbox_m(3.5, 1.5), 1.0);
        assert_eq!(overlay.texture_size(), (4, 2));
        let ramp = ColorRamp::builtin(RampName::Viridis);

        // 3x2 grid: the texture's last column stays empty
        let grid = [0.0, 0.5, 1.0, f32::NAN, 0.25, 0.75];
        overlay.update_data(&grid, 3, 2, &ramp).unwrap();

        let first = ramp.stops()[0].color.to_rgb8();
        let last = ramp.stops()[4].color.to_rgb8();
        assert_eq!(texel(&overlay, 0, 0), &[first[0], first[1], first[2], 180]);
        assert_eq!(texel(&overlay, 2, 0), &[last[0], last[1], last[2], 180]);
        assert_eq!(texel(&overlay, 0, 1)[3], 0);
        assert_eq!(&texel(&overlay, 0, 1)[..3], &ramp.null_color().to_rgb8());
        assert_eq!(texel(&overlay, 3, 0), &[0, 0, 0, 0]);
        assert!(overlay.needs_upload());
    }

    #[test]
    fn test_grid_larger_than_texture_is_cropped() {
        let mut overlay = GroundRasterOverlay::with_resolution(bbox_m(1.5, 0.5), 1.0);
        let ramp = ColorRamp::builtin(RampName::Blues);
        overlay.update_data(&[0.0; 25], 5, 5, &ramp).unwrap();
        assert_eq!(overlay.texels().len(), 2 * 4);
        assert!(overlay.texels().chunks_exact(4).all(|t| t[3] == 180));
    }

    #[test]
    fn test_collapsed_domain_uses_midpoint() {
        let mut overlay = GroundRasterOverlay::with_resolution(bbox_m(1.5, 0.5), 1.0);
        let ramp = ColorRamp::builtin(RampName::Magma).with_domain(5.0, 5.0);
        overlay.update_data(&[-100.0, 1e6], 2, 1, &ramp).unwrap();

        let mid = ramp.stops()[2].color.to_rgb8();
        assert_eq!(&texel(&overlay, 0, 0)[..3], &mid);
        assert_eq!(&texel(&overlay, 1, 0)[..3], &mid);
    }

    #[test]
    fn test_short_grid_rejected() {
        let mut overlay = GroundRasterOverlay::with_resolution(bbox_m(1.5, 1.5), 1.0);
        let ramp = ColorRamp::builtin(RampName::Blues);
        assert!(overlay.update_data(&[0.0; 3], 2, 2, &ramp).is_err());
    }

    #[test]
    fn test_visibility_and_opacity() {
        let mut overlay = GroundRasterOverlay::new(bbox_m(10.0, 10.0), OverlayConfig::default());
        assert!(!overlay.is_visible());
        assert_eq!(overlay.opacity(), 0.6);

        overlay.mark_uploaded();
        overlay.set_visible(true);
        overlay.set_opacity(0.25);
        assert!(overlay.is_visible());
        assert_eq!(overlay.opacity(), 0.25);
        assert!(!overlay.needs_upload());
    }

    #[test]
    fn test_plane_position_and_orientation() {
        let bbox = BBox::new(0.0, 0.0, 0.002, 0.001);
        let overlay = GroundRasterOverlay::new(bbox, OverlayConfig::default());
        let projector = CoordinateProjector::new(0.0, 0.0);

        let pos = overlay.plane_position(&projector);
        let center = projector.project(0.001, 0.0005);
        assert_relative_eq!(pos.x, center.x);
        assert_relative_eq!(pos.y, 0.1);
        assert_relative_eq!(pos.z, -center.y);

        let plane = overlay.plane().unwrap();
        // NW corner (index 3) is at -Z with v = 1
        assert!(plane.mesh.positions[11] < 0.0);
        assert_eq!(&plane.uvs[6..8], &[0.0, 1.0]);
        assert!(plane.mesh.normals.chunks_exact(3).all(|n| n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut overlay = GroundRasterOverlay::new(bbox_m(10.0, 10.0), OverlayConfig::default());
        overlay.dispose();
        overlay.dispose();
        assert!(overlay.is_disposed());
        assert!(overlay.texels().is_empty());

        let ramp = ColorRamp::builtin(RampName::Viridis);
        overlay.update_data(&[1.0], 1, 1, &ramp).unwrap();
        assert!(overlay.texels().is_empty());
        assert!(!overlay.needs_upload());
    }
}
