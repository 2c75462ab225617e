// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions and triangulation

use crate::error::{Error, Result};
use crate::triangulation::{deviation, signed_area, triangulate_polygon_with_holes};
use collage_core::{open_ring, CoordinateProjector, GeoPolygon};
use collage_core::geo_types::LineString;
use nalgebra::Point2;

/// Maximum relative area mismatch accepted from the triangulator
const MAX_DEVIATION: f64 = 0.01;

/// Profiles smaller than this (m²) are treated as degenerate
const MIN_AREA: f64 = 1e-9;

/// 2D Profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise once normalized)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise once normalized)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Project a geographic polygon into the local metric frame.
    ///
    /// Closing coordinates are dropped and winding is normalized.
    pub fn from_polygon(polygon: &GeoPolygon, projector: &CoordinateProjector) -> Self {
        let project_ring = |ring: &LineString<f64>| -> Vec<Point2<f64>> {
            open_ring(ring)
                .iter()
                .map(|&c| {
                    let p = projector.project_coord(c);
                    Point2::new(p.x, p.y)
                })
                .collect()
        };

        let mut profile = Self::new(project_ring(polygon.exterior()));
        for interior in polygon.interiors() {
            profile.add_hole(project_ring(interior));
        }
        profile.normalize_winding();
        profile
    }

    /// Make the outer ring counter-clockwise and every hole clockwise
    pub fn normalize_winding(&mut self) {
        if signed_area(&self.outer) < 0.0 {
            self.outer.reverse();
        }
        for hole in &mut self.holes {
            if signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
    }

    /// Enclosed area: outer minus holes
    pub fn area(&self) -> f64 {
        let holes: f64 = self
            .holes
            .iter()
            .filter(|h| h.len() >= 3)
            .map(|h| signed_area(h).abs())
            .sum();
        signed_area(&self.outer).abs() - holes
    }

    /// Triangulate the profile using earcutr
    ///
    /// Fails on fewer than three outer vertices, zero-area profiles, and
    /// triangulations whose area does not match the profile (self-intersections).
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }
        let finite = |ring: &[Point2<f64>]| ring.iter().all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite(&self.outer) || !self.holes.iter().all(|h| finite(h)) {
            return Err(Error::InvalidProfile("Profile has non-finite vertices".to_string()));
        }

        let area = self.area();
        if area.is_nan() || area <= MIN_AREA {
            return Err(Error::InvalidProfile(format!(
                "Profile encloses no area ({:.3e} m²)",
                area
            )));
        }

        let indices = triangulate_polygon_with_holes(&self.outer, &self.holes)?;
        if indices.is_empty() {
            return Err(Error::TriangulationError("No triangles produced".to_string()));
        }

        let mut points = self.outer.clone();
        for hole in self.holes.iter().filter(|h| h.len() >= 3) {
            points.extend_from_slice(hole);
        }

        let error = deviation(&points, &indices, area);
        if error > MAX_DEVIATION {
            return Err(Error::TriangulationError(format!(
                "Triangulated area deviates by {:.1}% (self-intersecting ring?)",
                error * 100.0
            )));
        }

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

/// Create a rectangular profile centered on the origin
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use collage_core::Footprint;

    #[test]
    fn test_rectangle_profile() {
        let profile = create_rectangle(10.0, 5.0);
        assert_eq!(profile.outer.len(), 4);
        assert_eq!(profile.holes.len(), 0);
        assert_eq!(profile.outer[0], Point2::new(-5.0, -2.5));
        assert_eq!(profile.outer[2], Point2::new(5.0, 2.5));
        assert_relative_eq!(profile.area(), 50.0);
    }

    #[test]
    fn test_triangulate_rectangle() {
        let tri = create_rectangle(10.0, 5.0).triangulate().unwrap();
        assert_eq!(tri.points.len(), 4);
        assert_eq!(tri.indices.len(), 6);
    }

    #[test]
    fn test_normalize_winding() {
        let mut profile = create_rectangle(4.0, 4.0);
        profile.outer.reverse();
        profile.add_hole(create_rectangle(1.0, 1.0).outer);
        profile.normalize_winding();

        assert!(signed_area(&profile.outer) > 0.0);
        assert!(signed_area(&profile.holes[0]) < 0.0);
        assert_relative_eq!(profile.area(), 15.0);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let mut profile = create_rectangle(10.0, 10.0);
        profile.add_hole(create_rectangle(4.0, 4.0).outer);
        profile.normalize_winding();

        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), 8);
        assert!(tri.indices.len() > 6);
    }

    #[test]
    fn test_collinear_profile_rejected() {
        let profile = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ]);
        assert!(matches!(profile.triangulate(), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn test_too_few_vertices_rejected() {
        let profile = Profile2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(profile.triangulate().is_err());
    }

    #[test]
    fn test_from_polygon_projects_and_opens_ring() {
        let projector = CoordinateProjector::new(0.0, 0.0);
        // Clockwise in lng/lat, closed
        let footprint = Footprint::from_rings(vec![vec![
            [0.0, 0.0],
            [0.0, 0.001],
            [0.001, 0.001],
            [0.001, 0.0],
            [0.0, 0.0],
        ]]);
        let polygon = &footprint.polygons()[0];
        let profile = Profile2D::from_polygon(polygon, &projector);

        assert_eq!(profile.outer.len(), 4);
        assert!(signed_area(&profile.outer) > 0.0);
        // ~111 m on each side at the equator
        assert_relative_eq!(profile.area().sqrt(), 111.195, max_relative = 1e-4);
    }
}
