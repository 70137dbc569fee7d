//! Stereographic projection from a pole point onto a plane

use bevy::math::Vec3;

use super::plane::{PlaneHit, ProjectionPlane};
use super::ray::ray_through;

/// Points closer than this to the pole have no usable image
pub const POLE_EPSILON: f32 = 1e-4;

/// Project `point` onto `plane` along the ray from `pole` through `point`.
///
/// The pole itself has no image (no direction to cast along), and points whose
/// ray leaves the plane's extent are dropped.
pub fn project(pole: Vec3, point: Vec3, plane: &ProjectionPlane) -> Option<PlaneHit> {
    if pole.distance_squared(point) < POLE_EPSILON * POLE_EPSILON {
        return None;
    }
    let ray = ray_through(pole, point)?;
    plane.intersect(&ray)
}
