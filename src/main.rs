//! Spheremap - projects a textured glTF model onto a sphere and two planes
//!
//! Main entry point: app setup and system registration.

use bevy::{dev_tools::fps_overlay::FpsOverlayPlugin, diagnostic::FrameTimeDiagnosticsPlugin, prelude::*};
use spheremap::{
    CurrentSettings, ExportConfig, ModelState, PendingModel, ProjectionCanvases, ProjectionConfig,
    SamplingGeometry, TogglePanelState, ViewerSettings, constants::*, draw_debug_rays,
    draw_helpers, export_when_ready, manual_export, orbit_camera, poll_model_load, request_model,
    save_settings_system, setup_scene, spawn_canvas_strip, spawn_toggle_panel, sync_visibility,
    toggle_panel_input, update_toggle_panel, upload_canvases,
};

fn main() {
    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();
    let export_and_quit = args.iter().any(|a| a == "--export-and-quit");

    // Load persistent settings (uses defaults if file doesn't exist), then apply
    // --model / --mesh overrides for this run only
    let mut current_settings = CurrentSettings::new(ViewerSettings::load());
    current_settings.apply_args(&args);
    let settings = &current_settings.settings;
    info!(
        "Model: assets/{} (mesh {})",
        settings.model_path,
        settings
            .mesh_name
            .clone()
            .unwrap_or_else(|| settings.mesh_index.to_string())
    );

    let panel_visible = settings.panel_visible;

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "spheremap".into(),
                    ..default()
                }),
                ..default()
            }),
            FrameTimeDiagnosticsPlugin::default(),
            FpsOverlayPlugin::default(),
        ))
        .insert_resource(ClearColor(BACKGROUND_COLOR))
        .insert_resource(current_settings)
        .insert_resource(TogglePanelState {
            selected_index: 0,
            visible: panel_visible,
        })
        .insert_resource(ExportConfig {
            exit_after_export: export_and_quit,
            ..default()
        })
        .init_resource::<ModelState>()
        .init_resource::<SamplingGeometry>()
        .init_resource::<ProjectionConfig>()
        .init_resource::<ProjectionCanvases>()
        .add_systems(
            Startup,
            (setup_scene, request_model, spawn_toggle_panel, spawn_canvas_strip),
        )
        // Model load -> projection -> canvas upload
        .add_systems(
            Update,
            (
                poll_model_load.run_if(resource_exists::<PendingModel>),
                upload_canvases,
            )
                .chain(),
        )
        // Scene display
        .add_systems(
            Update,
            (
                orbit_camera,
                toggle_panel_input,
                update_toggle_panel,
                sync_visibility,
                draw_helpers,
                draw_debug_rays,
            )
                .chain(),
        )
        // Export and settings persistence
        .add_systems(
            Update,
            (manual_export, export_when_ready, save_settings_system),
        )
        .run();
}
