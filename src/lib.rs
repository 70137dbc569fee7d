//! Spheremap - projects a textured glTF model onto a sampling sphere and two planes
//!
//! This crate provides the projection math, canvases, and the Bevy resources and
//! systems that load the model, run the projection and display the results.

// Core modules
pub mod canvas;
pub mod constants;
pub mod export;
pub mod projection;
pub mod settings;

// App modules
pub mod camera;
pub mod model;
pub mod scene;
pub mod ui;

// Re-export commonly used types for convenience
pub use camera::{OrbitCamera, orbit_camera};
pub use canvas::Canvas;
pub use constants::*;
pub use export::{
    EXPORT_DIR, ExportConfig, ExportError, export_canvases, export_when_ready, manual_export,
};
pub use model::{
    DebugRay, DebugRays, HitMarker, ModelMesh, ModelState, PendingModel, ProjectionSummary,
    RayGroup, poll_model_load, request_model,
};
pub use projection::{
    CanvasSet, MeshExtractError, MeshHit, PaintCounts, PlaneHit, ProjectedSample, ProjectionOutcome,
    ProjectionPlane, ProjectionSetup, SampleError, SamplingSphere, TextureSampler, TriMesh,
    run_projection,
};
pub use scene::{
    PerspectivePlaneMesh, ProjectionCanvases, ProjectionConfig, SamplingGeometry,
    SamplingSphereMesh, StereographicPlaneMesh, draw_debug_rays, draw_helpers, setup_scene,
    sync_visibility, upload_canvases,
};
pub use settings::{
    CurrentSettings, ModelSelection, SETTINGS_FILE, ViewerSettings, VisibilityToggles, save_settings_system,
};
pub use ui::{
    CanvasStrip, ModelStatusText, TogglePanel, TogglePanelState, ToggleRow, spawn_canvas_strip,
    spawn_toggle_panel, toggle_panel_input, update_toggle_panel,
};
