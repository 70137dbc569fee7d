//! Orbit camera: left-drag to orbit around the focus point, scroll to zoom

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;

use crate::constants::{CAMERA_MAX_DISTANCE, CAMERA_MIN_DISTANCE, ORBIT_SENSITIVITY, ZOOM_SENSITIVITY};

/// Keeps pitch short of the poles so the up vector stays valid
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Pixels per scroll "line" when the platform reports pixel deltas
const PIXELS_PER_LINE: f32 = 16.0;

/// Spherical camera rig around `focus`
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub distance: f32,
    /// Rotation about +Y (radians), 0 looks down -Z
    pub yaw: f32,
    /// Elevation above the XZ plane (radians)
    pub pitch: f32,
}

impl OrbitCamera {
    /// Camera on +Z at `distance`, looking at `focus`
    pub fn looking_at(focus: Vec3, distance: f32) -> Self {
        Self {
            focus,
            distance,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + delta.y * ORBIT_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive lines zoom in
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * ZOOM_SENSITIVITY).max(0.1);
        self.distance = (self.distance * factor).clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
    }

    pub fn transform(&self) -> Transform {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
        let position = self.focus + rotation * Vec3::Z * self.distance;
        Transform::from_translation(position).looking_at(self.focus, Vec3::Y)
    }
}

/// Apply mouse drag and scroll to every orbit camera
pub fn orbit_camera(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let drag = if mouse_buttons.pressed(MouseButton::Left) {
        mouse_motion.delta
    } else {
        Vec2::ZERO
    };
    let lines = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_LINE,
    };
    if drag == Vec2::ZERO && lines == 0.0 {
        return;
    }

    for (mut orbit, mut transform) in &mut cameras {
        orbit.orbit(drag);
        orbit.zoom(lines);
        *transform = orbit.transform();
    }
}
