// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building mesh synthesis
//!
//! Turns a batch of [`BuildingEntity`] footprints into one renderable mesh:
//!
//! - **Context mode**: one scaled unit box per entity, placed at the footprint's
//!   vertex centroid. Never drops an entity and keeps an instance → id table for
//!   picking.
//! - **Focal mode**: every footprint polygon (holes included) is triangulated,
//!   extruded to the building height and merged into a single vertex/index buffer.
//!   Entities that fail to extrude are skipped and listed in the [`BuildReport`].
//!
//! All output is in the renderer's y-up frame: `X` east, `Y` up, `Z` south.

use crate::config::SynthesisConfig;
use crate::extrusion::extrude_profile;
use crate::instancing::{unit_box, InstanceTransform, InstancedMesh};
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use crate::{Error, Result};
use collage_core::{
    open_ring, BuildingEntity, Color, ColorRamp, CoordinateProjector, LocalPoint, MetricValues,
};
use nalgebra::Vector3;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Fidelity of the synthesized mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Instanced boxes for large batches
    Context,
    /// Merged extrusions for close-up views
    Focal,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Focal => "focal",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "context" => Ok(Self::Context),
            "focal" => Ok(Self::Focal),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

/// A built mesh in one of the two modes
#[derive(Debug, Clone)]
pub enum RenderMesh {
    Instanced(InstancedMesh),
    Merged(Mesh),
}

impl RenderMesh {
    pub fn mode(&self) -> RenderMode {
        match self {
            Self::Instanced(_) => RenderMode::Context,
            Self::Merged(_) => RenderMode::Focal,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Instanced(instances) => instances.is_empty(),
            Self::Merged(mesh) => mesh.is_empty(),
        }
    }
}

/// An entity that produced no geometry
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntity {
    /// Position in the input batch
    pub index: usize,
    pub id: String,
    pub reason: String,
}

/// Outcome of [`BuildingMeshSynthesizer::set_entities`]
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub mode: RenderMode,
    /// Entities in the batch
    pub requested: usize,
    /// Entities that contributed geometry
    pub built: usize,
    pub skipped: Vec<SkippedEntity>,
}

impl BuildReport {
    fn new(mode: RenderMode, requested: usize) -> Self {
        Self {
            mode,
            requested,
            built: 0,
            skipped: Vec::new(),
        }
    }

    #[inline]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when every entity was built
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Builds and owns the building mesh for one projector origin
///
/// Rebuilds are whole-batch: [`set_entities`](Self::set_entities) releases the
/// previous mesh before building a new one.
#[derive(Debug, Clone)]
pub struct BuildingMeshSynthesizer {
    projector: CoordinateProjector,
    config: SynthesisConfig,
    mesh: Option<RenderMesh>,
    highlighted: Option<usize>,
    opacity: f32,
}

impl BuildingMeshSynthesizer {
    pub fn new(projector: CoordinateProjector, config: SynthesisConfig) -> Self {
        let opacity = config.opacity;
        Self {
            projector,
            config,
            mesh: None,
            highlighted: None,
            opacity,
        }
    }

    /// Synthesizer centered on `(origin_lng, origin_lat)` with default settings
    pub fn with_origin(origin_lng: f64, origin_lat: f64) -> Self {
        Self::new(
            CoordinateProjector::new(origin_lng, origin_lat),
            SynthesisConfig::default(),
        )
    }

    #[inline]
    pub fn projector(&self) -> &CoordinateProjector {
        &self.projector
    }

    #[inline]
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    #[inline]
    pub fn mesh(&self) -> Option<&RenderMesh> {
        self.mesh.as_ref()
    }

    #[inline]
    pub fn mode(&self) -> Option<RenderMode> {
        self.mesh.as_ref().map(RenderMesh::mode)
    }

    /// Instance table, in context mode
    pub fn instanced(&self) -> Option<&InstancedMesh> {
        match &self.mesh {
            Some(RenderMesh::Instanced(instances)) => Some(instances),
            _ => None,
        }
    }

    /// Mutable instance table, e.g. to clear dirty flags after upload
    pub fn instanced_mut(&mut self) -> Option<&mut InstancedMesh> {
        match &mut self.mesh {
            Some(RenderMesh::Instanced(instances)) => Some(instances),
            _ => None,
        }
    }

    /// Merged buffers, in focal mode
    pub fn merged(&self) -> Option<&Mesh> {
        match &self.mesh {
            Some(RenderMesh::Merged(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// Instance currently holding the highlight
    #[inline]
    pub fn highlighted_instance(&self) -> Option<usize> {
        self.highlighted
    }

    /// Replace the current mesh with one built from `entities`
    ///
    /// An empty batch yields an empty mesh. Per-entity failures (focal mode only)
    /// are reported, never returned as errors.
    pub fn set_entities(&mut self, entities: &[BuildingEntity], mode: RenderMode) -> BuildReport {
        self.dispose();

        let (mesh, report) = match mode {
            RenderMode::Context => {
                let (instances, report) = self.build_context(entities);
                (RenderMesh::Instanced(instances), report)
            }
            RenderMode::Focal => {
                let (merged, report) = self.build_focal(entities);
                (RenderMesh::Merged(merged), report)
            }
        };

        tracing::debug!(
            mode = %mode,
            requested = report.requested,
            built = report.built,
            skipped = report.skipped_count(),
            "building mesh synthesized"
        );

        self.mesh = Some(mesh);
        report
    }

    fn build_context(&self, entities: &[BuildingEntity]) -> (InstancedMesh, BuildReport) {
        let geometry = match unit_box() {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::error!(error = %e, "unit box construction failed");
                Mesh::new()
            }
        };
        let mut instances = InstancedMesh::new(geometry, entities.len());
        let mut report = BuildReport::new(RenderMode::Context, entities.len());

        for entity in entities {
            let transform = self.context_transform(entity);
            instances.push(&entity.id, transform, self.config.base_color);
            report.built += 1;
        }

        (instances, report)
    }

    /// Box placement for one entity
    ///
    /// Position is the projected mean of the outer ring's vertices (not the area
    /// centroid); extents are the projected ring's bounding box, clamped below.
    fn context_transform(&self, entity: &BuildingEntity) -> InstanceTransform {
        let min_size = self.config.min_footprint_m;
        let height = entity.known_height().unwrap_or(self.config.default_height_m);

        let ring = entity.footprint.outer_ring().map(open_ring).unwrap_or(&[]);

        let (center, width, depth) = if ring.is_empty() {
            (LocalPoint::default(), min_size, min_size)
        } else {
            let n = ring.len() as f64;
            let (sum_lng, sum_lat) = ring
                .iter()
                .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
            let center = self.projector.project(sum_lng / n, sum_lat / n);

            let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
            let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
            for &coord in ring {
                let p = self.projector.project_coord(coord);
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_y = min_y.min(p.y);
                max_y = max_y.max(p.y);
            }

            (center, (max_x - min_x).max(min_size), (max_y - min_y).max(min_size))
        };

        InstanceTransform::new(
            Vector3::new(center.x, height / 2.0, -center.y),
            Vector3::new(width, height, depth),
        )
    }

    fn build_focal(&self, entities: &[BuildingEntity]) -> (Mesh, BuildReport) {
        let mut report = BuildReport::new(RenderMode::Focal, entities.len());
        let mut built: Vec<Mesh> = Vec::with_capacity(entities.len());

        for (index, entity) in entities.iter().enumerate() {
            match self.extrude_entity(entity) {
                Ok(mesh) => {
                    built.push(mesh);
                    report.built += 1;
                }
                Err(e) => {
                    tracing::warn!(id = %entity.id, reason = %e, "skipping building");
                    report.skipped.push(SkippedEntity {
                        index,
                        id: entity.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut merged = Mesh::new();
        merged.merge_all(&built);
        (merged, report)
    }

    /// Extrude every polygon of an entity's footprint
    ///
    /// Fails only when no polygon produces geometry.
    fn extrude_entity(&self, entity: &BuildingEntity) -> Result<Mesh> {
        let height = entity.known_height().unwrap_or(self.config.default_height_m);
        let polygons = entity.footprint.polygons();

        let mut parts: SmallVec<[Mesh; 1]> = SmallVec::new();
        let mut first_error = None;

        for polygon in polygons {
            let profile = Profile2D::from_polygon(polygon, &self.projector);
            match extrude_profile(&profile, height, None) {
                Ok(mut mesh) => {
                    mesh.to_y_up();
                    parts.push(mesh);
                }
                Err(e) => {
                    tracing::debug!(id = %entity.id, error = %e, "footprint part not extruded");
                    first_error.get_or_insert(e);
                }
            }
        }

        match parts.len() {
            0 => Err(first_error
                .unwrap_or_else(|| Error::EmptyMesh("footprint has no polygons".to_string()))),
            1 => Ok(parts.remove(0)),
            _ => {
                let mut mesh = Mesh::new();
                mesh.merge_all(&parts);
                Ok(mesh)
            }
        }
    }

    /// Color every instance from per-entity metric values
    ///
    /// Entities with a finite value get `color_fn(value)`; missing or NaN values
    /// get `null_color`. Context mode only; returns false (and does nothing)
    /// otherwise. A current highlight is kept on top of the new colors.
    pub fn color_by_metric<F>(&mut self, values: &MetricValues, color_fn: F, null_color: Color) -> bool
    where
        F: Fn(f64) -> Color,
    {
        let highlight = self.config.highlight_color;
        let highlighted = self.highlighted;
        let Some(instances) = self.instanced_mut() else {
            return false;
        };

        for index in 0..instances.len() {
            let value = instances
                .entity_id(index)
                .and_then(|id| values.get(id))
                .copied()
                .flatten()
                .filter(|v| !v.is_nan());
            let color = value.map(&color_fn).unwrap_or(null_color);
            instances.set_color(index, color);
        }

        if let Some(index) = highlighted {
            instances.set_color(index, highlight);
        }
        true
    }

    /// [`color_by_metric`](Self::color_by_metric) through a ramp and its domain
    pub fn color_by_ramp(&mut self, values: &MetricValues, ramp: &ColorRamp) -> bool {
        self.color_by_metric(values, |v| ramp.color_for(Some(v)), ramp.null_color())
    }

    /// Move the highlight to `entity_id`, or clear it with `None`
    ///
    /// The previously highlighted instance goes back to the neutral base color.
    /// Returns true if an instance now holds the highlight.
    pub fn highlight_entity(&mut self, entity_id: Option<&str>) -> bool {
        let base = self.config.base_color;
        let highlight = self.config.highlight_color;
        let previous = self.highlighted.take();

        let Some(instances) = self.instanced_mut() else {
            return false;
        };

        if let Some(index) = previous {
            instances.set_color(index, base);
        }

        let target = entity_id.and_then(|id| instances.index_of(id));
        if let Some(index) = target {
            instances.set_color(index, highlight);
        }

        self.highlighted = target;
        target.is_some()
    }

    /// Entity id behind an instance index, for picking. Context mode only.
    pub fn entity_id_at_instance(&self, index: usize) -> Option<&str> {
        self.instanced()?.entity_id(index)
    }

    /// Instance index of an entity id. Context mode only.
    pub fn instance_of_entity(&self, entity_id: &str) -> Option<usize> {
        self.instanced()?.index_of(entity_id)
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

    /// Release the mesh and id table. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.mesh.take().is_some() {
            tracing::debug!("building mesh released");
        }
        self.highlighted = None;
        self.opacity = self.config.opacity;
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.mesh.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use collage_core::{Footprint, RampName};

    fn square(id: &str, lng: f64, lat: f64, size: f64, height: Option<f64>) -> BuildingEntity {
        let ring = vec![
            [lng, lat],
            [lng + size, lat],
            [lng + size, lat + size],
            [lng, lat + size],
            [lng, lat],
        ];
        BuildingEntity::new(id, Footprint::from_rings(vec![ring]), height)
    }

    fn batch() -> Vec<BuildingEntity> {
        vec![
            square("a", 0.0, 0.0, 0.0002, Some(12.0)),
            square("b", 0.001, 0.0, 0.0002, None),
            square("c", 0.002, 0.0, 0.0002, Some(30.0)),
        ]
    }

    fn values(pairs: &[(&str, Option<f64>)]) -> MetricValues {
        pairs.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Focal".parse::<RenderMode>().unwrap(), RenderMode::Focal);
        assert_eq!(RenderMode::Context.to_string(), "context");
        assert!("wireframe".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_context_centroid_excludes_closing_vertex() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        // Triangle: the closing duplicate would pull the mean toward (0, 0)
        let entity = BuildingEntity::new(
            "t",
            Footprint::from_rings(vec![vec![[0.0, 0.0], [0.003, 0.0], [0.0, 0.003], [0.0, 0.0]]]),
            Some(5.0),
        );
        synth.set_entities(&[entity], RenderMode::Context);

        let t = synth.instanced().unwrap().transforms()[0];
        let expected = synth.projector().project(0.001, 0.001);
        assert_relative_eq!(t.position.x, expected.x, max_relative = 1e-9);
        assert_relative_eq!(t.position.z, -expected.y, max_relative = 1e-9);
        assert_relative_eq!(t.position.y, 2.5);
    }

    #[test]
    fn test_context_min_footprint() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        let sliver = square("s", 0.0, 0.0, 1e-7, None);
        let empty = BuildingEntity::new("e", Footprint::from_rings(Vec::new()), None);
        let report = synth.set_entities(&[sliver, empty], RenderMode::Context);

        assert_eq!(report.built, 2);
        let transforms = synth.instanced().unwrap().transforms();
        assert_eq!(transforms[0].scale.x, 2.0);
        assert_eq!(transforms[0].scale.z, 2.0);
        assert_eq!(transforms[1].scale, Vector3::new(2.0, 9.0, 2.0));
        assert_eq!(transforms[1].position, Vector3::new(0.0, 4.5, 0.0));
    }

    #[test]
    fn test_color_by_metric() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch(), RenderMode::Context);
        synth.instanced_mut().unwrap().mark_uploaded();

        let ramp = ColorRamp::builtin(RampName::Viridis).with_domain(0.0, 10.0);
        let applied = synth.color_by_ramp(&values(&[("a", Some(0.0)), ("c", Some(10.0)), ("b", None)]), &ramp);
        assert!(applied);

        let instances = synth.instanced().unwrap();
        assert!(instances.colors_need_update());
        assert!(!instances.matrices_need_update());
        assert_eq!(instances.color(0), Some(ramp.stops()[0].color));
        assert_eq!(instances.color(1), Some(ramp.null_color()));
        assert_eq!(instances.color(2), Some(ramp.stops()[4].color));
    }

    #[test]
    fn test_missing_ids_get_null_color() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch(), RenderMode::Context);
        let null = Color::from_u32(0x808080);
        synth.color_by_metric(&values(&[("a", Some(f64::NAN))]), |_| Color::WHITE, null);

        let instances = synth.instanced().unwrap();
        assert!((0..3).all(|i| instances.color(i) == Some(null)));
    }

    #[test]
    fn test_highlight_moves_and_restores() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch(), RenderMode::Context);
        let base = synth.config().base_color;
        let highlight = synth.config().highlight_color;

        assert!(synth.highlight_entity(Some("b")));
        assert_eq!(synth.highlighted_instance(), Some(1));
        assert_eq!(synth.instanced().unwrap().color(1), Some(highlight));

        assert!(synth.highlight_entity(Some("c")));
        let instances = synth.instanced().unwrap();
        assert_eq!(instances.color(1), Some(base));
        assert_eq!(instances.color(2), Some(highlight));

        assert!(!synth.highlight_entity(Some("nope")));
        assert_eq!(synth.instanced().unwrap().color(2), Some(base));
        assert_eq!(synth.highlighted_instance(), None);

        synth.highlight_entity(Some("a"));
        assert!(!synth.highlight_entity(None));
        assert_eq!(synth.instanced().unwrap().color(0), Some(base));
    }

    #[test]
    fn test_metric_coloring_keeps_highlight() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch(), RenderMode::Context);
        synth.highlight_entity(Some("a"));
        synth.color_by_metric(&values(&[("a", Some(1.0))]), |_| Color::BLACK, Color::WHITE);
        assert_eq!(synth.instanced().unwrap().color(0), Some(synth.config().highlight_color));
    }

    #[test]
    fn test_operations_without_mesh_are_noops() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        assert!(!synth.color_by_metric(&MetricValues::default(), |_| Color::WHITE, Color::BLACK));
        assert!(!synth.highlight_entity(Some("a")));
        assert_eq!(synth.entity_id_at_instance(0), None);
        assert_eq!(synth.mode(), None);
    }

    #[test]
    fn test_focal_mode_has_no_instance_lookup() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        let report = synth.set_entities(&batch(), RenderMode::Focal);
        assert!(report.is_complete());
        assert_eq!(synth.mode(), Some(RenderMode::Focal));
        assert_eq!(synth.entity_id_at_instance(0), None);
        assert!(!synth.highlight_entity(Some("a")));
        assert!(!synth.color_by_metric(&MetricValues::default(), |_| Color::WHITE, Color::BLACK));
    }

    #[test]
    fn test_focal_heights_are_up() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch()[2..], RenderMode::Focal);
        let (min, max) = synth.merged().unwrap().bounds();
        assert_relative_eq!(min.y, 0.0);
        assert_relative_eq!(max.y, 30.0);
        // Footprint lies north of the origin, so it extends along -Z
        assert!(max.z <= 0.0);
    }

    #[test]
    fn test_focal_skips_bad_entities() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        let mut entities = batch();
        entities.insert(
            1,
            BuildingEntity::new(
                "line",
                Footprint::from_rings(vec![vec![[0.0, 0.0], [0.001, 0.001], [0.002, 0.002]]]),
                None,
            ),
        );
        entities.push(square("flat", 0.003, 0.0, 0.0002, Some(0.0)));

        let report = synth.set_entities(&entities, RenderMode::Focal);
        assert_eq!(report.requested, 5);
        assert_eq!(report.built, 3);
        let skipped: Vec<(usize, &str)> =
            report.skipped.iter().map(|s| (s.index, s.id.as_str())).collect();
        assert_eq!(skipped, vec![(1, "line"), (4, "flat")]);
        assert!(synth.merged().unwrap().indices_in_bounds());
    }

    #[test]
    fn test_focal_multipolygon_keeps_good_parts() {
        use collage_core::geo_types::{LineString, MultiPolygon, Polygon};

        let part = |coords: Vec<(f64, f64)>| Polygon::new(LineString::from(coords), Vec::new());
        let footprint = Footprint::MultiPolygon(MultiPolygon(vec![
            part(vec![(0.0, 0.0), (0.0002, 0.0), (0.0002, 0.0002), (0.0, 0.0002)]),
            part(vec![(0.0, 0.0), (0.0001, 0.0)]),
        ]));
        let single = square("x", 0.0, 0.0, 0.0002, None);

        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        let report = synth.set_entities(&[BuildingEntity::new("m", footprint, None)], RenderMode::Focal);
        assert_eq!(report.built, 1);
        let multi_vertices = synth.merged().unwrap().vertex_count();

        synth.set_entities(&[single], RenderMode::Focal);
        assert_eq!(multi_vertices, synth.merged().unwrap().vertex_count());
    }

    #[test]
    fn test_rebuild_replaces_and_resets() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_entities(&batch(), RenderMode::Context);
        synth.highlight_entity(Some("a"));
        synth.set_opacity(0.3);

        let report = synth.set_entities(&[], RenderMode::Context);
        assert_eq!(report.built, 0);
        assert!(synth.instanced().unwrap().is_empty());
        assert_eq!(synth.highlighted_instance(), None);
        assert_eq!(synth.opacity(), 0.85);
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut synth = BuildingMeshSynthesizer::with_origin(0.0, 0.0);
        synth.set_opacity(1.7);
        assert_eq!(synth.opacity(), 1.0);
        synth.set_opacity(f32::NAN);
        assert_eq!(synth.opacity(), 1.0);
    }
}
