// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthesis and overlay settings
//!
//! Both deserialize from the host's camelCase JSON; missing fields take their
//! defaults.

use collage_core::{Color, DEFAULT_HEIGHT_M};
use serde::{Deserialize, Serialize};

/// Settings for [`crate::BuildingMeshSynthesizer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisConfig {
    /// Height used when an entity has none (m)
    pub default_height_m: f64,
    /// Lower bound on context-mode box width and depth (m)
    pub min_footprint_m: f64,
    /// Neutral instance color before metric coloring
    pub base_color: Color,
    /// Color of the highlighted instance
    pub highlight_color: Color,
    /// Material opacity
    pub opacity: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            default_height_m: DEFAULT_HEIGHT_M,
            min_footprint_m: 2.0,
            base_color: Color::from_u32(0xcccccc),
            highlight_color: Color::from_u32(0xffaa00),
            opacity: 0.85,
        }
    }
}

/// Settings for [`crate::GroundRasterOverlay`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    /// Texture pixels per metre (0.5 = one pixel per 2 m)
    pub resolution_px_per_m: f64,
    /// Alpha written for finite cells
    pub cell_alpha: u8,
    /// Material opacity
    pub opacity: f32,
    /// Plane lift above the ground (m)
    pub elevation_m: f64,
    /// Initial visibility
    pub visible: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            resolution_px_per_m: 0.5,
            cell_alpha: 180,
            opacity: 0.6,
            elevation_m: 0.1,
            visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_defaults() {
        let config = SynthesisConfig::default();
        assert_eq!(config.default_height_m, 9.0);
        assert_eq!(config.min_footprint_m, 2.0);
        assert_eq!(config.base_color.to_hex(), "#cccccc");
        assert_eq!(config.opacity, 0.85);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SynthesisConfig =
            serde_json::from_str(r##"{"highlightColor": "#ff0000", "minFootprintM": 1}"##).unwrap();
        assert_eq!(config.highlight_color, Color::from_u32(0xff0000));
        assert_eq!(config.min_footprint_m, 1.0);
        assert_eq!(config.default_height_m, 9.0);

        let overlay: OverlayConfig = serde_json::from_str(r#"{"resolutionPxPerM": 2.0}"#).unwrap();
        assert_eq!(overlay.resolution_px_per_m, 2.0);
        assert_eq!(overlay.cell_alpha, 180);
        assert!(!overlay.visible);
    }

    #[test]
    fn test_bad_color_rejected() {
        let result = serde_json::from_str::<SynthesisConfig>(r#"{"baseColor": "grey"}"#);
        assert!(result.is_err());
    }
}
