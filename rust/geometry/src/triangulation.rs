// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for 2D polygon triangulation, plus the area checks used
//! to reject self-intersecting footprints.

use crate::{Error, Point2, Result};

/// Signed shoelace area; positive for counter-clockwise rings
#[inline]
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        twice_area += p0.x * p1.y - p1.x * p0.y;
    }
    twice_area / 2.0
}

/// Check if a polygon is convex (all cross products have same sign)
#[inline]
fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];

        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    sign != 0
}

/// Simple fan triangulation for convex polygons
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity((n - 2) * 3);
    for i in 1..n - 1 {
        indices.push(0);
        indices.push(i);
        indices.push(i + 1);
    }
    indices
}

#[inline]
fn flatten(outer: &[Point2<f64>], holes: &[&Vec<Point2<f64>>]) -> (Vec<f64>, Vec<usize>) {
    let total_points = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut vertices = Vec::with_capacity(total_points * 2);
    for p in outer {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(vertices.len() / 2);
        for p in hole.iter() {
            vertices.push(p.x);
            vertices.push(p.y);
        }
    }

    (vertices, hole_indices)
}

/// Triangulate a simple polygon (no holes)
/// Returns triangle indices into the input points
#[inline]
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    // Footprints are mostly small convex shapes; fanning them skips earcut.
    if n <= 8 && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    let (vertices, _) = flatten(points, &[]);
    earcutr::earcut(&vertices, &[], 2).map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Triangulate a polygon with holes
///
/// Holes with fewer than 3 points are ignored. Returns triangle indices into the
/// combined vertex array (outer, then each remaining hole in order).
#[inline]
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points in outer boundary".to_string(),
        ));
    }

    let valid_holes: Vec<&Vec<Point2<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();

    if valid_holes.is_empty() {
        return triangulate_polygon(outer);
    }

    let (vertices, hole_indices) = flatten(outer, &valid_holes);
    earcutr::earcut(&vertices, &hole_indices, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Sum of the unsigned areas of the triangles in `indices`
#[inline]
pub fn triangulated_area(points: &[Point2<f64>], indices: &[usize]) -> f64 {
    indices
        .chunks_exact(3)
        .map(|tri| {
            let (a, b, c) = (&points[tri[0]], &points[tri[1]], &points[tri[2]]);
            ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
        })
        .sum()
}

/// Relative difference between the triangulated area and the polygon area.
///
/// Zero for a correct triangulation. Large values mean earcut had to guess,
/// which happens for self-intersecting rings.
#[inline]
pub fn deviation(points: &[Point2<f64>], indices: &[usize], polygon_area: f64) -> f64 {
    let triangles_area = triangulated_area(points, indices);
    if polygon_area == 0.0 && triangles_area == 0.0 {
        return 0.0;
    }
    ((polygon_area - triangles_area) / polygon_area).abs()
}
