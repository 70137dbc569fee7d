//! UV sampling sphere geometry and ray/sphere intersection
//!
//! Vertex `i` owns position `i` and uv `i`, so the projection pass can paint
//! each sample at its own place in the sphere texture.

use bevy::asset::RenderAssetUsages;
use bevy::math::{Ray3d, Vec2, Vec3};
use bevy::mesh::{Indices, Mesh, PrimitiveTopology};
use std::f32::consts::{PI, TAU};

use super::ray::RAY_EPSILON;

/// Latitude/longitude sphere with a seam column (width_segments + 1 vertices per row)
#[derive(Debug, Clone)]
pub struct SamplingSphere {
    pub radius: f32,
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl SamplingSphere {
    /// Rows run from the +Y pole (v = 1) down to the -Y pole (v = 0).
    /// Pole rows shift u by half a segment (+ north, - south) so each pole
    /// vertex sits at the middle of the triangle it caps.
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row_len = width_segments + 1;

        let mut positions = Vec::with_capacity((row_len * (height_segments + 1)) as usize);
        let mut uvs = Vec::with_capacity(positions.capacity());

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                positions.push(Vec3::new(
                    -radius * cos_phi * sin_theta,
                    radius * cos_theta,
                    radius * sin_phi * sin_theta,
                ));
                uvs.push(Vec2::new(u + u_offset, 1.0 - v));
            }
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row_len + ix + 1;
                let b = iy * row_len + ix;
                let c = (iy + 1) * row_len + ix;
                let d = (iy + 1) * row_len + ix + 1;
                // Top and bottom rows collapse to a point; skip the degenerate half
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            radius,
            positions,
            uvs,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Render mesh sharing this geometry's vertex layout
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        let normals: Vec<[f32; 3]> = self
            .positions
            .iter()
            .map(|p| p.normalize_or_zero().to_array())
            .collect();
        // Canvas rows run top-down while v runs up
        let uvs: Vec<[f32; 2]> = self.uvs.iter().map(|uv| [uv.x, 1.0 - uv.y]).collect();

        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
            .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

/// Distance to the nearest intersection in front of the ray origin.
/// From inside the sphere this is the exit point.
pub fn intersect_sphere(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let dir = *ray.direction;
    let oc = ray.origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    if near > RAY_EPSILON {
        return Some(near);
    }
    let far = -b + root;
    (far > RAY_EPSILON).then_some(far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ray::ray_through;

    #[test]
    fn vertex_layout_matches_segment_counts() {
        let sphere = SamplingSphere::new(1.0, 8, 4);
        assert_eq!(sphere.vertex_count(), 9 * 5);
        assert_eq!(sphere.uvs.len(), sphere.positions.len());
        // 8 triangles in each pole row, 16 in each of the 2 middle rows
        assert_eq!(sphere.indices.len(), (8 + 8 + 16 + 16) * 3);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertex_count()));
    }

    #[test]
    fn vertices_lie_on_radius_and_poles_are_on_y() {
        let sphere = SamplingSphere::new(2.5, 16, 12);
        for p in &sphere.positions {
            assert!((p.length() - 2.5).abs() < 1e-4);
        }
        assert!((sphere.positions[0] - Vec3::new(0.0, 2.5, 0.0)).length() < 1e-4);
        assert!((sphere.uvs[0].y - 1.0).abs() < 1e-6);
        let last = *sphere.positions.last().unwrap();
        assert!((last - Vec3::new(0.0, -2.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn pole_rows_shift_u_by_half_a_segment() {
        let sphere = SamplingSphere::new(1.0, 8, 4);
        let row_len = 9;
        let half = 0.5 / 8.0;

        assert!((sphere.uvs[0].x - half).abs() < 1e-6);
        assert!((sphere.uvs[3].x - (3.0 / 8.0 + half)).abs() < 1e-6);
        // Middle rows are unshifted
        assert!((sphere.uvs[row_len + 3].x - 3.0 / 8.0).abs() < 1e-6);

        let south = 4 * row_len;
        assert!((sphere.uvs[south].x + half).abs() < 1e-6);
        assert!((sphere.uvs[south + 8].x - (1.0 - half)).abs() < 1e-6);
        assert!((sphere.uvs[south].y).abs() < 1e-6);
    }

    #[test]
    fn origin_ray_through_surface_point_hits_at_radius() {
        let sphere = SamplingSphere::new(1.0, 24, 16);
        for &p in sphere.positions.iter().step_by(7) {
            let ray = ray_through(Vec3::ZERO, p).expect("surface point is not the origin");
            let distance = intersect_sphere(&ray, Vec3::ZERO, sphere.radius).expect("hit");
            assert!((distance - sphere.radius).abs() < 1e-5, "distance {}", distance);
        }
    }

    #[test]
    fn outside_ray_hits_near_side_and_can_miss() {
        let toward = ray_through(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO).unwrap();
        let distance = intersect_sphere(&toward, Vec3::ZERO, 1.0).unwrap();
        assert!((distance - 4.0).abs() < 1e-5);

        let aside = ray_through(Vec3::new(3.0, 0.0, 5.0), Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert!(intersect_sphere(&aside, Vec3::ZERO, 1.0).is_none());
    }
}
