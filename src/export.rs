//! Canvas export - writes the projection canvases as PNGs
//!
//! `P` exports on demand (canvases plus a window screenshot). With
//! `--export-and-quit` the app exports once the projection has run and exits.

use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, save_to_disk};
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::ModelState;
use crate::projection::CanvasSet;
use crate::scene::ProjectionCanvases;

/// Directory where exports are saved
pub const EXPORT_DIR: &str = "exports";

/// Frames to wait after queueing the screenshot before exiting
const EXIT_DELAY_FRAMES: u32 = 30;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Image(image::ImageError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "io error: {}", e),
            ExportError::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        ExportError::Image(e)
    }
}

/// Export behaviour
#[derive(Resource, Default)]
pub struct ExportConfig {
    /// Export once the projection has run, then exit (--export-and-quit)
    pub exit_after_export: bool,
    /// Set once the automatic export has run
    pub exported: bool,
    /// Frames left before exiting
    pub exit_countdown: Option<u32>,
}

/// Fresh `exports/<timestamp>` directory path
pub fn timestamped_dir(root: &Path) -> PathBuf {
    root.join(Local::now().format("%Y%m%d_%H%M%S_%3f").to_string())
}

/// Write all three canvases into `dir` (created if missing)
pub fn export_canvases(canvases: &CanvasSet, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;
    let targets = [
        ("sphere.png", &canvases.sphere),
        ("perspective.png", &canvases.perspective),
        ("stereographic.png", &canvases.stereographic),
    ];

    let mut written = Vec::with_capacity(targets.len());
    for (name, canvas) in targets {
        let path = dir.join(name);
        canvas.save_png(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Export canvases and queue a screenshot into a new timestamped directory
fn export_now(commands: &mut Commands, canvases: &CanvasSet) -> bool {
    let dir = timestamped_dir(Path::new(EXPORT_DIR));
    match export_canvases(canvases, &dir) {
        Ok(paths) => info!("Exported {} canvases to {}", paths.len(), dir.display()),
        Err(e) => {
            warn!("Failed to export canvases to {}: {}", dir.display(), e);
            return false;
        }
    }

    let screenshot = dir.join("screenshot.png");
    info!("Screenshot queued: {}", screenshot.display());
    commands
        .spawn(Screenshot::primary_window())
        .observe(save_to_disk(screenshot));
    true
}

/// Manual export (P key)
pub fn manual_export(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    canvases: Res<ProjectionCanvases>,
) {
    if keyboard.just_pressed(KeyCode::KeyP) {
        export_now(&mut commands, &canvases.set);
    }
}

/// Export once the projection has run, then exit (--export-and-quit).
/// A model that failed to load or could not be projected exits with an error
/// and nothing is written.
pub fn export_when_ready(
    mut commands: Commands,
    mut config: ResMut<ExportConfig>,
    model_state: Res<ModelState>,
    canvases: Res<ProjectionCanvases>,
    mut exit: MessageWriter<AppExit>,
) {
    if !config.exit_after_export {
        return;
    }

    if let Some(frames) = config.exit_countdown {
        if frames == 0 {
            info!("Exiting after export");
            exit.write(AppExit::Success);
        } else {
            config.exit_countdown = Some(frames - 1);
        }
        return;
    }

    if config.exported {
        return;
    }
    match &*model_state {
        ModelState::Loading => return,
        ModelState::Failed(_) | ModelState::Unprojected(_) => {
            config.exported = true;
            error!("Nothing to export: {}", *model_state);
            exit.write(AppExit::error());
            return;
        }
        ModelState::Projected(_) => {}
    }

    config.exported = true;
    info!("{}, exporting", *model_state);
    if !export_now(&mut commands, &canvases.set) {
        exit.write(AppExit::error());
        return;
    }
    // Wait for the screenshot to be written
    config.exit_countdown = Some(EXIT_DELAY_FRAMES);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_export_root(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("spheremap_export_{}_{}", tag, nanos))
    }

    fn quit_app(state: ModelState) -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            bevy::asset::AssetPlugin {
                watch_for_changes_override: Some(false),
                ..default()
            },
        ))
        .init_asset::<Image>()
        .init_resource::<ProjectionCanvases>()
        .insert_resource(state)
        .insert_resource(ExportConfig {
            exit_after_export: true,
            ..default()
        })
        .add_systems(Update, export_when_ready);
        app
    }

    #[test]
    fn failed_model_exits_with_error_without_exporting() {
        let mut app = quit_app(ModelState::Failed("path not found".into()));
        app.update();

        assert_eq!(app.should_exit(), Some(AppExit::error()));
        let config = app.world().resource::<ExportConfig>();
        assert!(config.exported);
        assert_eq!(config.exit_countdown, None);
    }

    #[test]
    fn unprojected_model_exits_with_error() {
        let mut app = quit_app(ModelState::Unprojected("material has no base color texture".into()));
        app.update();
        assert_eq!(app.should_exit(), Some(AppExit::error()));
    }

    #[test]
    fn loading_model_keeps_waiting() {
        let mut app = quit_app(ModelState::Loading);
        app.update();
        app.update();
        assert_eq!(app.should_exit(), None);
        assert!(!app.world().resource::<ExportConfig>().exported);
    }

    #[test]
    fn writes_three_readable_pngs() {
        let root = temp_export_root("pngs");
        let mut canvases = CanvasSet::default();
        canvases.stereographic.fill_block(0, 0, 2, [1, 2, 3, 255]);

        let dir = timestamped_dir(&root);
        let paths = export_canvases(&canvases, &dir).expect("export");
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists(), "{} missing", path.display());
        }

        let stereographic = image::open(dir.join("stereographic.png")).unwrap().to_rgba8();
        assert_eq!(stereographic.dimensions(), (canvases.stereographic.width(), canvases.stereographic.height()));
        assert_eq!(stereographic.get_pixel(1, 1).0, [1, 2, 3, 255]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn export_fails_when_directory_cannot_be_created() {
        let root = temp_export_root("blocked");
        fs::create_dir_all(&root).unwrap();
        let file = root.join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let result = export_canvases(&CanvasSet::default(), &file.join("sub"));
        assert!(matches!(result, Err(ExportError::Io(_))));

        let _ = fs::remove_dir_all(&root);
    }
}
