//! Persistent viewer settings
//!
//! Saves and loads the model selection, model placement and visibility toggles
//! to/from viewer_settings.json in the config directory. Command-line flags
//! override the file for a single run.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_MODEL_OFFSET, DEFAULT_MODEL_PATH, DEFAULT_MODEL_ROLL};

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/viewer_settings.json";

/// Show/hide state for every toggleable part of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityToggles {
    pub mesh: bool,
    pub sphere_rays: bool,
    pub perspective_rays: bool,
    pub stereographic_rays: bool,
    pub sphere: bool,
    pub perspective_plane: bool,
    pub stereographic_plane: bool,
}

impl Default for VisibilityToggles {
    fn default() -> Self {
        Self {
            mesh: true,
            sphere_rays: true,
            perspective_rays: true,
            stereographic_rays: true,
            sphere: true,
            perspective_plane: true,
            stereographic_plane: true,
        }
    }
}

impl VisibilityToggles {
    pub const LABELS: [&'static str; 7] = [
        "mesh visibility",
        "debug ray visibility (sphere)",
        "debug ray visibility (perspective)",
        "debug ray visibility (stereographic)",
        "sphere visibility",
        "perspective plane visibility",
        "stereographic plane visibility",
    ];

    pub fn get(&self, index: usize) -> bool {
        match index {
            0 => self.mesh,
            1 => self.sphere_rays,
            2 => self.perspective_rays,
            3 => self.stereographic_rays,
            4 => self.sphere,
            5 => self.perspective_plane,
            6 => self.stereographic_plane,
            _ => false,
        }
    }

    pub fn set(&mut self, index: usize, value: bool) {
        match index {
            0 => self.mesh = value,
            1 => self.sphere_rays = value,
            2 => self.perspective_rays = value,
            3 => self.stereographic_rays = value,
            4 => self.sphere = value,
            5 => self.perspective_plane = value,
            6 => self.stereographic_plane = value,
            _ => {}
        }
    }

    pub fn flip(&mut self, index: usize) {
        self.set(index, !self.get(index));
    }
}

/// Settings that survive between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// glTF file, relative to the assets directory
    pub model_path: String,
    /// Mesh to project, by glTF name (takes precedence over mesh_index)
    pub mesh_name: Option<String>,
    /// Mesh to project, by position in the glTF mesh list
    pub mesh_index: usize,
    /// World-space translation applied to the model
    pub model_offset: [f32; 3],
    /// Rotation about the view axis (radians)
    pub model_roll: f32,
    /// Toggle panel shown at startup
    pub panel_visible: bool,
    pub visibility: VisibilityToggles,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.to_string(),
            mesh_name: None,
            mesh_index: 0,
            model_offset: DEFAULT_MODEL_OFFSET.to_array(),
            model_roll: DEFAULT_MODEL_ROLL,
            panel_visible: true,
            visibility: VisibilityToggles::default(),
        }
    }
}

impl ViewerSettings {
    /// Load settings from the default file, or return defaults if it doesn't exist
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(Path::new(SETTINGS_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Apply `--model <path>` and `--mesh <name>` overrides
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(path) = flag_value(args, "--model") {
            self.model_path = path.to_string();
        }
        if let Some(name) = flag_value(args, "--mesh") {
            match name.parse::<usize>() {
                Ok(index) => {
                    self.mesh_name = None;
                    self.mesh_index = index;
                }
                Err(_) => self.mesh_name = Some(name.to_string()),
            }
        }
    }

    /// Placement of the model in the scene
    pub fn model_transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.model_offset))
            .with_rotation(Quat::from_rotation_z(self.model_roll))
    }
}

/// Value following `flag` on the command line
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Model choice that `--model` / `--mesh` may override for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub model_path: String,
    pub mesh_name: Option<String>,
    pub mesh_index: usize,
}

impl ModelSelection {
    fn of(settings: &ViewerSettings) -> Self {
        Self {
            model_path: settings.model_path.clone(),
            mesh_name: settings.mesh_name.clone(),
            mesh_index: settings.mesh_index,
        }
    }

    fn restore_into(&self, settings: &mut ViewerSettings) {
        settings.model_path = self.model_path.clone();
        settings.mesh_name = self.mesh_name.clone();
        settings.mesh_index = self.mesh_index;
    }
}

/// Resource tracking the current settings (for change detection)
#[derive(Resource)]
pub struct CurrentSettings {
    /// Settings in effect, including command-line overrides
    pub settings: ViewerSettings,
    pub dirty: bool,
    /// Model choice as loaded from the file; this is what gets saved
    persisted_model: ModelSelection,
}

impl Default for CurrentSettings {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

impl CurrentSettings {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            persisted_model: ModelSelection::of(&settings),
            settings,
            dirty: false,
        }
    }

    /// Apply `--model` / `--mesh` for this run without touching the saved choice
    pub fn apply_args(&mut self, args: &[String]) {
        self.settings.apply_args(args);
    }

    /// Settings as they should be written to disk
    pub fn to_persist(&self) -> ViewerSettings {
        let mut settings = self.settings.clone();
        self.persisted_model.restore_into(&mut settings);
        settings
    }

    /// Mark settings as changed (will be saved on next update)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Save if dirty
    pub fn save_if_dirty(&mut self) {
        self.save_if_dirty_to(Path::new(SETTINGS_FILE));
    }

    pub fn save_if_dirty_to(&mut self, path: &Path) {
        if self.dirty {
            if let Err(e) = self.to_persist().save_to(path) {
                warn!("Failed to save settings: {}", e);
            }
            self.dirty = false;
        }
    }
}

/// System to save settings when changed
pub fn save_settings_system(mut settings: ResMut<CurrentSettings>) {
    if settings.dirty {
        settings.save_if_dirty();
    }
}
