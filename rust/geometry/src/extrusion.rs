// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes
//!
//! Profiles are extruded along +Z in the local east/north/up frame. Callers that
//! feed a y-up renderer convert afterwards with [`Mesh::to_y_up`].

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Extrude a 2D profile along the Z axis
///
/// The profile is expected to have a counter-clockwise outer ring and clockwise
/// holes (see [`Profile2D::normalize_winding`]); all faces then wind
/// counter-clockwise when seen from outside.
#[inline]
pub fn extrude_profile(
    profile: &Profile2D,
    depth: f64,
    transform: Option<Matrix4<f64>>,
) -> Result<Mesh> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(Error::InvalidExtrusion(format!(
            "Depth must be positive, got {}",
            depth
        )));
    }

    let triangulation = profile.triangulate()?;

    let ring_vertex_count =
        profile.outer.len() + profile.holes.iter().map(|h| h.len()).sum::<usize>();
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + ring_vertex_count * 4,
        triangulation.indices.len() * 2 + ring_vertex_count * 6,
    );

    create_cap_mesh(&triangulation, 0.0, false, &mut mesh);
    create_cap_mesh(&triangulation, depth, true, &mut mesh);

    create_side_walls(&profile.outer, depth, &mut mesh);
    for hole in profile.holes.iter().filter(|h| h.len() >= 3) {
        create_side_walls(hole, depth, &mut mesh);
    }

    if mesh.triangle_count() == 0 {
        return Err(Error::EmptyMesh("Extrusion produced no faces".to_string()));
    }

    if let Some(mat) = transform {
        apply_transform(&mut mesh, &mat);
    }

    Ok(mesh)
}

/// Create a cap mesh (top or bottom) from triangulation
///
/// Triangles are re-wound per face so that the top cap is counter-clockwise seen
/// from +Z and the bottom cap counter-clockwise seen from -Z, whatever order the
/// triangulator emitted.
#[inline]
fn create_cap_mesh(triangulation: &Triangulation, z: f64, facing_up: bool, mesh: &mut Mesh) {
    let base_index = mesh.vertex_count() as u32;
    let normal = if facing_up {
        Vector3::new(0.0, 0.0, 1.0)
    } else {
        Vector3::new(0.0, 0.0, -1.0)
    };

    for point in &triangulation.points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), normal);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let (a, b, c) = (
            &triangulation.points[tri[0]],
            &triangulation.points[tri[1]],
            &triangulation.points[tri[2]],
        );
        let ccw = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y) > 0.0;

        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        if ccw == facing_up {
            mesh.add_triangle(i0, i1, i2);
        } else {
            mesh.add_triangle(i0, i2, i1);
        }
    }
}

/// Create side walls for a profile boundary
///
/// Each edge gets its own quad (4 vertices) so walls shade flat.
#[inline]
fn create_side_walls(boundary: &[Point2<f64>], depth: f64, mesh: &mut Mesh) {
    let base_index = mesh.vertex_count() as u32;
    let mut quad_count = 0u32;

    for i in 0..boundary.len() {
        let j = (i + 1) % boundary.len();

        let p0 = &boundary[i];
        let p1 = &boundary[j];

        // Right-hand normal of the edge: outward for CCW outers and CW holes.
        let edge = Vector3::new(p1.x - p0.x, p1.y - p0.y, 0.0);
        let normal = match Vector3::new(edge.y, -edge.x, 0.0).try_normalize(1e-10) {
            Some(n) => n,
            None => continue, // duplicate consecutive points
        };

        let v0_bottom = Point3::new(p0.x, p0.y, 0.0);
        let v1_bottom = Point3::new(p1.x, p1.y, 0.0);
        let v0_top = Point3::new(p0.x, p0.y, depth);
        let v1_top = Point3::new(p1.x, p1.y, depth);

        let idx = base_index + (quad_count * 4);
        mesh.add_vertex(v0_bottom, normal);
        mesh.add_vertex(v1_bottom, normal);
        mesh.add_vertex(v1_top, normal);
        mesh.add_vertex(v0_top, normal);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);

        quad_count += 1;
    }
}

/// Apply transformation matrix to mesh
#[inline]
pub fn apply_transform(mesh: &mut Mesh, transform: &Matrix4<f64>) {
    mesh.positions.chunks_exact_mut(3).for_each(|chunk| {
        let point = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
        let transformed = transform.transform_point(&point);
        chunk[0] = transformed.x as f32;
        chunk[1] = transformed.y as f32;
        chunk[2] = transformed.z as f32;
    });

    // Normals use the inverse transpose
    let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();

    mesh.normals.chunks_exact_mut(3).for_each(|chunk| {
        let normal = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
        let mapped = (normal_matrix * normal.to_homogeneous()).xyz();
        let transformed = mapped.try_normalize(1e-12).unwrap_or(mapped);
        chunk[0] = transformed.x as f32;
        chunk[1] = transformed.y as f32;
        chunk[2] = transformed.z as f32;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::create_rectangle;
    use approx::assert_relative_eq;

    /// Every triangle's geometric normal agrees with its stored vertex normal
    fn assert_outward_winding(mesh: &Mesh) {
        let pos = |i: u32| {
            let i = i as usize * 3;
            Vector3::new(
                mesh.positions[i] as f64,
                mesh.positions[i + 1] as f64,
                mesh.positions[i + 2] as f64,
            )
        };
        for tri in mesh.indices.chunks_exact(3) {
            let face = (pos(tri[1]) - pos(tri[0])).cross(&(pos(tri[2]) - pos(tri[0])));
            let n = tri[0] as usize * 3;
            let stored = Vector3::new(
                mesh.normals[n] as f64,
                mesh.normals[n + 1] as f64,
                mesh.normals[n + 2] as f64,
            );
            assert!(face.dot(&stored) > 0.0, "triangle {:?} faces inward", tri);
        }
    }

    #[test]
    fn test_extrude_rectangle() {
        let profile = create_rectangle(10.0, 5.0);
        let mesh = extrude_profile(&profile, 20.0, None).unwrap();

        // 2 caps x 4 vertices + 4 walls x 4 vertices
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, -5.0);
        assert_relative_eq!(max.x, 5.0);
        assert_relative_eq!(min.y, -2.5);
        assert_relative_eq!(max.y, 2.5);
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 20.0);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn test_extrude_with_hole_winds_outward() {
        let mut profile = create_rectangle(10.0, 10.0);
        profile.add_hole(create_rectangle(4.0, 4.0).outer);
        profile.normalize_winding();

        let mesh = extrude_profile(&profile, 6.0, None).unwrap();
        assert!(mesh.indices_in_bounds());
        assert_outward_winding(&mesh);

        // Hole walls face the hole center
        let has_inward_wall = mesh
            .normals
            .chunks_exact(3)
            .zip(mesh.positions.chunks_exact(3))
            .any(|(n, p)| (p[0] - 2.0).abs() < 1e-6 && n[0] < -0.99);
        assert!(has_inward_wall);
    }

    #[test]
    fn test_extrude_with_transform() {
        let profile = create_rectangle(10.0, 5.0);
        let transform = Matrix4::new_translation(&Vector3::new(100.0, 200.0, 300.0));

        let mesh = extrude_profile(&profile, 20.0, Some(transform)).unwrap();

        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, 95.0);
        assert_relative_eq!(max.y, 202.5);
        assert_relative_eq!(max.z, 320.0);
    }

    #[test]
    fn test_invalid_depth() {
        let profile = create_rectangle(10.0, 5.0);
        assert!(extrude_profile(&profile, -1.0, None).is_err());
        assert!(extrude_profile(&profile, 0.0, None).is_err());
        assert!(extrude_profile(&profile, f64::NAN, None).is_err());
    }

    #[test]
    fn test_duplicate_vertices_skip_walls() {
        let mut profile = create_rectangle(2.0, 2.0);
        let first = profile.outer[0];
        profile.outer.insert(1, first);

        let mesh = extrude_profile(&profile, 3.0, None).unwrap();
        // Degenerate edge yields no wall
        assert_eq!(mesh.vertex_count(), 2 * 5 + 4 * 4);
        assert!(mesh.indices_in_bounds());
    }
}
