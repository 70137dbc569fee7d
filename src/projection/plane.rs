//! Rectangular projection planes

use bevy::asset::RenderAssetUsages;
use bevy::math::primitives::InfinitePlane3d;
use bevy::math::{Dir3, Ray3d, Vec2, Vec3};
use bevy::mesh::{Indices, Mesh, PrimitiveTopology};

use crate::constants::{
    PERSPECTIVE_PLANE_DISTANCE, PERSPECTIVE_PLANE_HALF_EXTENT, STEREOGRAPHIC_PLANE_HALF_EXTENT,
    STEREOGRAPHIC_PLANE_Z,
};

/// Intersection with a projection plane, inside its extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    pub distance: f32,
    pub point: Vec3,
    /// (0, 0) at the -u/-v corner, (1, 1) at the +u/+v corner
    pub uv: Vec2,
}

/// Finite plane with an orthonormal frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionPlane {
    pub center: Vec3,
    pub normal: Dir3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub half_extent: Vec2,
}

impl ProjectionPlane {
    /// Plane facing +Z (toward the viewer) with u along +X and v along +Y
    pub fn facing_viewer(center: Vec3, half_extent: Vec2) -> Self {
        Self {
            center,
            normal: Dir3::Z,
            u_axis: Vec3::X,
            v_axis: Vec3::Y,
            half_extent,
        }
    }

    /// Plane hit by origin rays, at a fixed offset along the view axis (-Z)
    pub fn perspective() -> Self {
        Self::facing_viewer(
            Vec3::new(0.0, 0.0, -PERSPECTIVE_PLANE_DISTANCE),
            Vec2::splat(PERSPECTIVE_PLANE_HALF_EXTENT),
        )
    }

    /// Plane tangent to the sampling sphere opposite the stereographic pole
    pub fn stereographic() -> Self {
        Self::facing_viewer(
            Vec3::new(0.0, 0.0, STEREOGRAPHIC_PLANE_Z),
            Vec2::splat(STEREOGRAPHIC_PLANE_HALF_EXTENT),
        )
    }

    /// Point on the plane for a uv inside [0, 1]^2
    pub fn point_at(&self, uv: Vec2) -> Vec3 {
        let local = (uv - Vec2::splat(0.5)) * 2.0 * self.half_extent;
        self.center + self.u_axis * local.x + self.v_axis * local.y
    }

    /// Intersect a ray with the plane. Parallel rays, hits behind the ray
    /// origin and hits outside the extent return None.
    pub fn intersect(&self, ray: &Ray3d) -> Option<PlaneHit> {
        let distance = ray.intersect_plane(self.center, InfinitePlane3d { normal: self.normal })?;
        let point = ray.get_point(distance);
        let local = point - self.center;
        let uv = Vec2::new(
            local.dot(self.u_axis) / (2.0 * self.half_extent.x) + 0.5,
            local.dot(self.v_axis) / (2.0 * self.half_extent.y) + 0.5,
        );
        if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
            return None;
        }
        Some(PlaneHit { distance, point, uv })
    }

    /// Quad whose texture coordinates agree with `intersect`
    pub fn to_mesh(&self) -> Mesh {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let positions: Vec<[f32; 3]> = corners.iter().map(|&uv| self.point_at(uv).to_array()).collect();
        let normals = vec![self.normal.to_array(); 4];
        // Canvas rows run top-down while v runs up
        let uvs: Vec<[f32; 2]> = corners.iter().map(|uv| [uv.x, 1.0 - uv.y]).collect();

        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
            .with_inserted_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]))
    }
}
