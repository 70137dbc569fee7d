//! Ray construction and ray/triangle intersection

use bevy::math::{Dir3, Ray3d, Vec3};

/// Minimum accepted hit distance and determinant magnitude
pub const RAY_EPSILON: f32 = 1e-6;

/// Build a ray from `origin` pointing at `target`.
/// Returns None when the two points coincide (no direction).
pub fn ray_through(origin: Vec3, target: Vec3) -> Option<Ray3d> {
    Dir3::new(target - origin)
        .ok()
        .map(|direction| Ray3d::new(origin, direction))
}

/// Result of a ray/triangle test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub distance: f32,
    /// Weights of the triangle's vertices (a, b, c) at the hit point
    pub barycentric: Vec3,
}

impl TriangleHit {
    /// Interpolate a per-vertex attribute at the hit point
    pub fn interpolate<T>(&self, a: T, b: T, c: T) -> T
    where
        T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        a * self.barycentric.x + b * self.barycentric.y + c * self.barycentric.z
    }
}

/// Moller-Trumbore intersection, double sided.
/// Rays parallel to the triangle (grazing) and hits at or behind the origin miss.
pub fn intersect_triangle(ray: &Ray3d, a: Vec3, b: Vec3, c: Vec3) -> Option<TriangleHit> {
    let dir = *ray.direction;
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < RAY_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let distance = edge2.dot(qvec) * inv_det;
    if distance <= RAY_EPSILON {
        return None;
    }

    Some(TriangleHit {
        distance,
        barycentric: Vec3::new(1.0 - u - v, u, v),
    })
}
