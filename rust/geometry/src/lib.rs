// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collage Geometry
//!
//! Building meshes and ground overlays for urban map scenes, using earcutr
//! triangulation and nalgebra for transformations.
//!
//! ```rust,ignore
//! use collage_geometry::{BuildingMeshSynthesizer, RenderMode};
//!
//! let mut synth = BuildingMeshSynthesizer::with_origin(2.35, 48.85);
//! let report = synth.set_entities(&entities, RenderMode::Focal);
//! println!("{} built, {} skipped", report.built, report.skipped_count());
//! ```

pub mod building;
pub mod config;
pub mod error;
pub mod extrusion;
pub mod ground;
pub mod instancing;
pub mod mesh;
pub mod profile;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use building::{BuildReport, BuildingMeshSynthesizer, RenderMesh, RenderMode, SkippedEntity};
pub use config::{OverlayConfig, SynthesisConfig};
pub use error::{Error, Result};
pub use extrusion::{apply_transform, extrude_profile};
pub use ground::{GroundPlane, GroundRasterOverlay};
pub use instancing::{unit_box, InstanceTransform, InstancedMesh};
pub use mesh::Mesh;
pub use profile::{create_rectangle, Profile2D, Triangulation};
pub use triangulation::{triangulate_polygon, triangulate_polygon_with_holes};
