//! Tunable constants for spheremap
//!
//! Geometry, canvas and view values are defined here for easy tweaking.

use bevy::prelude::*;

// =============================================================================
// SAMPLING SPHERE
// =============================================================================

pub const SPHERE_RADIUS: f32 = 1.0;
pub const SPHERE_WIDTH_SEGMENTS: u32 = 100;
pub const SPHERE_HEIGHT_SEGMENTS: u32 = 100;

/// All projection rays start here (sphere center)
pub const PROJECTION_ORIGIN: Vec3 = Vec3::ZERO;

// =============================================================================
// PROJECTION PLANES
// =============================================================================

/// Distance of the perspective plane from the origin along the view axis (-Z)
pub const PERSPECTIVE_PLANE_DISTANCE: f32 = 2.0;
pub const PERSPECTIVE_PLANE_HALF_EXTENT: f32 = 2.0;

/// Stereographic projection center (north pole, facing away from the model)
pub const STEREOGRAPHIC_POLE: Vec3 = Vec3::new(0.0, 0.0, SPHERE_RADIUS);
/// Stereographic plane is tangent to the sphere at the opposite pole
pub const STEREOGRAPHIC_PLANE_Z: f32 = -SPHERE_RADIUS;
pub const STEREOGRAPHIC_PLANE_HALF_EXTENT: f32 = 4.0;

// =============================================================================
// CANVASES
// =============================================================================

pub const SPHERE_CANVAS_SIZE: u32 = 256;
pub const PLANE_CANVAS_SIZE: u32 = 512;
pub const GRID_LINES: u32 = 16;

/// Block painted per sample on the sphere canvas (pixels per side)
pub const SPHERE_BLOCK_SIZE: u32 = 3;
/// Block painted per sample on the plane canvases (pixels per side)
pub const PLANE_BLOCK_SIZE: u32 = 10;

pub const CANVAS_BACKGROUND: [u8; 4] = [255, 255, 255, 64]; // rgba(255, 255, 255, 0.25)
pub const GRID_LINE_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Size of each canvas preview in the on-screen strip
pub const CANVAS_PREVIEW_SIZE: f32 = 192.0;

// =============================================================================
// MODEL
// =============================================================================

/// Relative to the assets/ directory
pub const DEFAULT_MODEL_PATH: &str = "models/scene.gltf";
pub const DEFAULT_MODEL_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -15.0);
pub const DEFAULT_MODEL_ROLL: f32 = std::f32::consts::PI;

pub const HIT_MARKER_RADIUS: f32 = 0.25;

/// Seconds between "still loading" log lines
pub const LOAD_PROGRESS_INTERVAL: f32 = 1.0;

// =============================================================================
// CAMERA
// =============================================================================

pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_START_DISTANCE: f32 = 5.0;
pub const CAMERA_MIN_DISTANCE: f32 = 0.5;
pub const CAMERA_MAX_DISTANCE: f32 = 200.0;
pub const ORBIT_SENSITIVITY: f32 = 0.005; // Radians per pixel of mouse drag
pub const ZOOM_SENSITIVITY: f32 = 0.1; // Fraction of distance per scroll line

// =============================================================================
// HELPERS (axes / grid / debug rays)
// =============================================================================

pub const AXES_LENGTH: f32 = 1.0;
pub const GRID_UNITS: u32 = 10;
pub const GRID_COLOR: Color = Color::srgb(0.45, 0.45, 0.45);
pub const SPHERE_RAY_COLOR: Color = Color::srgb(0.0, 0.0, 1.0);
pub const PERSPECTIVE_RAY_COLOR: Color = Color::srgb(0.0, 0.8, 0.3);
pub const STEREOGRAPHIC_RAY_COLOR: Color = Color::srgb(0.9, 0.4, 0.0);

// =============================================================================
// TEXT/UI COLORS
// =============================================================================

pub const BACKGROUND_COLOR: Color = Color::srgb(0.1, 0.1, 0.12);
pub const TEXT_PRIMARY: Color = Color::srgb(0.95, 0.9, 0.8);
pub const TEXT_SECONDARY: Color = Color::srgb(0.7, 0.65, 0.55);
pub const TEXT_SELECTED: Color = Color::srgb(1.0, 1.0, 0.0);
pub const TEXT_DISABLED: Color = Color::srgb(0.5, 0.5, 0.5);
