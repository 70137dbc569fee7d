//! Model loading and the one-shot projection
//!
//! The glTF is requested at startup and polled every frame. Once it and its
//! dependencies are loaded, the selected mesh is placed in the scene, copied
//! to the CPU for ray casting, and the projection pass paints the canvases.

use bevy::asset::RecursiveDependencyLoadState;
use bevy::gltf::{Gltf, GltfMesh, GltfNode};
use bevy::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use crate::constants::*;
use crate::projection::{
    ProjectionOutcome, SampleError, SamplingSphere, TextureSampler, TriMesh,
    linear_to_canvas_rgba8, run_projection,
};
use crate::scene::{ProjectionCanvases, ProjectionConfig, SamplingGeometry};
use crate::settings::{CurrentSettings, ViewerSettings};

/// Marker for the loaded model entity
#[derive(Component)]
pub struct ModelMesh;

/// Marker for the small spheres placed at each ray/model hit
#[derive(Component)]
pub struct HitMarker;

/// Model handle being waited on
#[derive(Resource)]
pub struct PendingModel {
    pub path: String,
    pub handle: Handle<Gltf>,
}

/// Where the model is in its lifecycle
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub enum ModelState {
    #[default]
    Loading,
    Failed(String),
    /// Model shown but not projected (no texture or unusable geometry)
    Unprojected(String),
    Projected(ProjectionSummary),
}

impl ModelState {
    /// True once loading has finished one way or another
    pub fn is_settled(&self) -> bool {
        !matches!(self, ModelState::Loading)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Loading => write!(f, "Loading model..."),
            ModelState::Failed(reason) => write!(f, "Model failed to load: {}", reason),
            ModelState::Unprojected(reason) => write!(f, "Model shown, not projected: {}", reason),
            ModelState::Projected(summary) => write!(
                f,
                "Projected {}/{} vertices | sphere {} | perspective {} | stereographic {}",
                summary.hits,
                summary.vertices,
                summary.painted_sphere,
                summary.painted_perspective,
                summary.painted_stereographic
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionSummary {
    pub vertices: usize,
    pub hits: usize,
    pub misses: usize,
    pub unsampled: usize,
    pub painted_sphere: usize,
    pub painted_perspective: usize,
    pub painted_stereographic: usize,
}

impl ProjectionSummary {
    pub fn from_outcome(vertices: usize, outcome: &ProjectionOutcome) -> Self {
        Self {
            vertices,
            hits: outcome.samples.len(),
            misses: outcome.misses,
            unsampled: outcome.unsampled,
            painted_sphere: outcome.painted.sphere,
            painted_perspective: outcome.painted.perspective,
            painted_stereographic: outcome.painted.stereographic,
        }
    }
}

/// Which projection a debug ray belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayGroup {
    Sphere,
    Perspective,
    Stereographic,
}

#[derive(Debug, Clone, Copy)]
pub struct DebugRay {
    pub group: RayGroup,
    pub start: Vec3,
    pub end: Vec3,
}

/// Rays recorded by the projection pass, drawn as gizmos
#[derive(Resource, Default)]
pub struct DebugRays {
    pub rays: Vec<DebugRay>,
}

impl DebugRays {
    pub fn from_outcome(outcome: &ProjectionOutcome, origin: Vec3, pole: Vec3) -> Self {
        let mut rays = Vec::with_capacity(outcome.samples.len() * 3);
        for sample in &outcome.samples {
            rays.push(DebugRay {
                group: RayGroup::Sphere,
                start: origin,
                end: sample.mesh_hit.point,
            });
            if let Some(hit) = sample.perspective {
                rays.push(DebugRay {
                    group: RayGroup::Perspective,
                    start: origin,
                    end: hit.point,
                });
            }
            if let Some(hit) = sample.stereographic {
                rays.push(DebugRay {
                    group: RayGroup::Stereographic,
                    start: pole,
                    end: hit.point,
                });
            }
        }
        Self { rays }
    }
}

/// Request the configured model
pub fn request_model(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    current_settings: Res<CurrentSettings>,
) {
    let path = current_settings.settings.model_path.clone();
    info!("Loading model from assets/{}", path);
    let handle = asset_server.load(path.clone());
    commands.insert_resource(PendingModel { path, handle });
}

/// Pick the mesh to project: by name if configured, else by index
fn select_mesh<H: Clone>(
    meshes: &[H],
    find_named: impl FnOnce(&str) -> Option<H>,
    settings: &ViewerSettings,
) -> Option<H> {
    if let Some(name) = &settings.mesh_name {
        match find_named(name) {
            Some(handle) => return Some(handle),
            None => warn!("No mesh named '{}' in model, falling back to index", name),
        }
    }
    meshes.get(settings.mesh_index).cloned()
}

/// Node pose from the file (scale, tilt) with the configured roll and offset on top
fn model_placement(settings: &ViewerSettings, node_transform: Option<Transform>) -> Transform {
    settings
        .model_transform()
        .mul_transform(node_transform.unwrap_or_default())
}

/// Decode the base color texture of `material` for sampling
fn diffuse_sampler(
    material: Option<&StandardMaterial>,
    images: &Assets<Image>,
) -> Result<TextureSampler, SampleError> {
    let texture = material
        .and_then(|m| m.base_color_texture.as_ref())
        .ok_or(SampleError::NoBaseColorTexture)?;
    let image = images.get(texture).ok_or(SampleError::TextureNotLoaded)?;
    TextureSampler::from_bevy_image(image)
}

/// World-space geometry and texture for the pass, or why the pass can't run
fn prepare_projection(
    mesh: Option<&Mesh>,
    transform: &Transform,
    material: Option<&StandardMaterial>,
    images: &Assets<Image>,
) -> Result<(TriMesh, TextureSampler), String> {
    let mesh = mesh.ok_or_else(|| "mesh data is not loaded".to_string())?;
    let tri_mesh = TriMesh::from_bevy_mesh(mesh, transform).map_err(|e| e.to_string())?;
    let sampler = diffuse_sampler(material, images).map_err(|e| e.to_string())?;
    Ok((tri_mesh, sampler))
}

/// Throttles the "still loading" log line
#[derive(Default)]
pub struct LoadProgressLog {
    since_last: f32,
    waited: f32,
}

impl LoadProgressLog {
    /// Advance by `delta` seconds; true when a progress line is due
    pub fn tick(&mut self, delta: f32) -> bool {
        self.waited += delta;
        self.since_last += delta;
        if self.since_last >= LOAD_PROGRESS_INTERVAL {
            self.since_last = 0.0;
            true
        } else {
            false
        }
    }

    pub fn waited(&self) -> f32 {
        self.waited
    }
}

/// Wait for the model, then place it and run the projection once
#[allow(clippy::too_many_arguments)]
pub fn poll_model_load(
    mut commands: Commands,
    pending: Res<PendingModel>,
    asset_server: Res<AssetServer>,
    time: Res<Time>,
    mut progress: Local<LoadProgressLog>,
    current_settings: Res<CurrentSettings>,
    gltfs: Res<Assets<Gltf>>,
    gltf_meshes: Res<Assets<GltfMesh>>,
    gltf_nodes: Res<Assets<GltfNode>>,
    images: Res<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut canvases: ResMut<ProjectionCanvases>,
    mut model_state: ResMut<ModelState>,
    geometry: Res<SamplingGeometry>,
    config: Res<ProjectionConfig>,
) {
    match asset_server.recursive_dependency_load_state(&pending.handle) {
        RecursiveDependencyLoadState::Loaded => {}
        RecursiveDependencyLoadState::Failed(err) => {
            error!("Failed to load model '{}': {}", pending.path, err);
            *model_state = ModelState::Failed(err.to_string());
            commands.remove_resource::<PendingModel>();
            return;
        }
        state => {
            if progress.tick(time.delta_secs()) {
                info!(
                    "Still loading '{}' ({:?}, {:.0}s)",
                    pending.path,
                    state,
                    progress.waited()
                );
            }
            return;
        }
    }
    commands.remove_resource::<PendingModel>();

    let settings = &current_settings.settings;
    let Some(gltf) = gltfs.get(&pending.handle) else {
        error!("Model '{}' reported loaded but is missing", pending.path);
        *model_state = ModelState::Failed("asset missing after load".to_string());
        return;
    };
    let Some(mesh_handle) = select_mesh(
        &gltf.meshes,
        |name| gltf.named_meshes.get(name).cloned(),
        settings,
    ) else {
        error!(
            "Model '{}' has no mesh at index {} ({} meshes)",
            pending.path,
            settings.mesh_index,
            gltf.meshes.len()
        );
        *model_state = ModelState::Failed("selected mesh not found".to_string());
        return;
    };
    let Some(primitive) = gltf_meshes
        .get(&mesh_handle)
        .and_then(|gltf_mesh| gltf_mesh.primitives.first())
    else {
        error!("Selected mesh in '{}' has no primitives", pending.path);
        *model_state = ModelState::Failed("selected mesh has no primitives".to_string());
        return;
    };

    let node_transform = gltf
        .nodes
        .iter()
        .filter_map(|handle| gltf_nodes.get(handle))
        .find(|node| node.mesh.as_ref() == Some(&mesh_handle))
        .map(|node| node.transform);
    let transform = model_placement(settings, node_transform);
    let material = primitive
        .material
        .clone()
        .unwrap_or_else(|| materials.add(StandardMaterial::default()));
    let visibility = if settings.visibility.mesh {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    commands.spawn((
        Mesh3d(primitive.mesh.clone()),
        MeshMaterial3d(material.clone()),
        transform,
        visibility,
        ModelMesh,
    ));
    info!("Placed model '{}' at {:?}", pending.path, transform.translation);

    let prepared = prepare_projection(
        meshes.get(&primitive.mesh),
        &transform,
        materials.get(&material),
        &images,
    );
    let (tri_mesh, sampler) = match prepared {
        Ok(prepared) => prepared,
        Err(reason) => {
            warn!("Skipping projection: {}", reason);
            *model_state = ModelState::Unprojected(reason);
            return;
        }
    };

    let started = Instant::now();
    let setup = &config.0;
    let outcome = run_projection(&geometry.0, &tri_mesh, &sampler, setup, &mut canvases.set);
    let summary = ProjectionSummary::from_outcome(geometry.0.vertex_count(), &outcome);
    info!(
        "Projected {} of {} sphere vertices against {} triangles in {:.1?} ({} missed, {} outside texture {}x{})",
        summary.hits,
        summary.vertices,
        tri_mesh.triangle_count(),
        started.elapsed(),
        summary.misses,
        summary.unsampled,
        sampler.width(),
        sampler.height()
    );

    spawn_hit_markers(
        &mut commands,
        &mut meshes,
        &mut materials,
        &outcome,
        settings.visibility.sphere_rays,
    );
    commands.insert_resource(DebugRays::from_outcome(&outcome, setup.origin, setup.pole));
    *model_state = ModelState::Projected(summary);
}

/// One small unlit sphere per hit, colored with the sampled texel
fn spawn_hit_markers(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    outcome: &ProjectionOutcome,
    visible: bool,
) {
    let marker_mesh = meshes.add(Sphere::new(HIT_MARKER_RADIUS).mesh().uv(25, 25));
    let visibility = if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };

    // Many hits share a texel color; share their materials too
    let mut by_color: HashMap<[u8; 4], Handle<StandardMaterial>> = HashMap::new();
    for sample in &outcome.samples {
        let key = linear_to_canvas_rgba8(sample.color);
        let material = by_color
            .entry(key)
            .or_insert_with(|| {
                materials.add(StandardMaterial {
                    base_color: Color::LinearRgba(sample.color),
                    unlit: true,
                    ..default()
                })
            })
            .clone();
        commands.spawn((
            Mesh3d(marker_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(sample.mesh_hit.point),
            visibility,
            HitMarker,
        ));
    }
    info!(
        "Spawned {} hit markers ({} colors)",
        outcome.samples.len(),
        by_color.len()
    );
}

/// Sphere geometry used for both sampling and display
pub fn default_sampling_sphere() -> SamplingSphere {
    SamplingSphere::new(SPHERE_RADIUS, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{MeshHit, PlaneHit, ProjectedSample};
    use bevy::color::LinearRgba;

    fn sample(perspective: bool, stereographic: bool) -> ProjectedSample {
        let plane_hit = PlaneHit {
            distance: 2.0,
            point: Vec3::new(0.0, 0.0, -2.0),
            uv: Vec2::splat(0.5),
        };
        ProjectedSample {
            vertex: 0,
            color: LinearRgba::RED,
            mesh_hit: MeshHit {
                distance: 15.0,
                point: Vec3::new(0.0, 0.0, -15.0),
                uv: Vec2::ZERO,
                triangle: 0,
            },
            perspective: perspective.then_some(plane_hit),
            stereographic: stereographic.then_some(plane_hit),
        }
    }

    #[test]
    fn debug_rays_follow_available_hits() {
        let outcome = ProjectionOutcome {
            samples: vec![sample(true, true), sample(false, true), sample(false, false)],
            ..Default::default()
        };
        let pole = Vec3::Z;
        let rays = DebugRays::from_outcome(&outcome, Vec3::ZERO, pole);

        let count = |group| rays.rays.iter().filter(|r| r.group == group).count();
        assert_eq!(count(RayGroup::Sphere), 3);
        assert_eq!(count(RayGroup::Perspective), 1);
        assert_eq!(count(RayGroup::Stereographic), 2);
        assert!(
            rays.rays
                .iter()
                .filter(|r| r.group == RayGroup::Stereographic)
                .all(|r| r.start == pole)
        );
    }

    #[test]
    fn summary_counts_match_outcome() {
        let mut outcome = ProjectionOutcome {
            samples: vec![sample(true, false)],
            misses: 7,
            unsampled: 2,
            ..Default::default()
        };
        outcome.painted.sphere = 1;
        outcome.painted.perspective = 1;

        let summary = ProjectionSummary::from_outcome(10, &outcome);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.misses, 7);
        assert_eq!(summary.unsampled, 2);
        assert_eq!(summary.painted_perspective, 1);
        assert!(ModelState::Projected(summary).to_string().contains("1/10"));
    }

    #[test]
    fn untextured_material_cannot_be_sampled() {
        let images = Assets::<Image>::default();
        let plain = StandardMaterial::default();
        assert_eq!(
            diffuse_sampler(Some(&plain), &images).err(),
            Some(SampleError::NoBaseColorTexture)
        );
        assert_eq!(
            diffuse_sampler(None, &images).err(),
            Some(SampleError::NoBaseColorTexture)
        );
    }

    #[test]
    fn mesh_selected_by_name_then_index() {
        let meshes = ["body", "hat", "base"];
        let named = |name: &str| meshes.iter().find(|m| **m == name).copied();

        let mut settings = ViewerSettings::default();
        assert_eq!(select_mesh(&meshes, named, &settings), Some("body"));

        settings.mesh_index = 2;
        assert_eq!(select_mesh(&meshes, named, &settings), Some("base"));

        settings.mesh_name = Some("hat".to_string());
        assert_eq!(select_mesh(&meshes, named, &settings), Some("hat"));

        // Unknown name falls back to the index
        settings.mesh_name = Some("cape".to_string());
        assert_eq!(select_mesh(&meshes, named, &settings), Some("base"));

        settings.mesh_index = 3;
        assert_eq!(select_mesh(&meshes, named, &settings), None);
    }

    #[test]
    fn placement_keeps_node_scale_and_tilt() {
        let settings = ViewerSettings::default();
        let node = Transform::from_scale(Vec3::splat(0.01))
            .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        let placed = model_placement(&settings, Some(node));

        assert!((placed.scale - Vec3::splat(0.01)).length() < 1e-6);
        assert!((placed.translation - DEFAULT_MODEL_OFFSET).length() < 1e-5);
        let expected = Quat::from_rotation_z(DEFAULT_MODEL_ROLL) * node.rotation;
        assert!(placed.rotation.angle_between(expected) < 1e-4);

        assert_eq!(model_placement(&settings, None), settings.model_transform());
    }

    #[test]
    fn untextured_model_is_not_projected() {
        let mesh = Mesh::from(Cuboid::default());
        let images = Assets::<Image>::default();
        let plain = StandardMaterial::default();

        let result = prepare_projection(Some(&mesh), &Transform::IDENTITY, Some(&plain), &images);
        assert_eq!(result.err().as_deref(), Some("material has no base color texture"));

        let result = prepare_projection(None, &Transform::IDENTITY, Some(&plain), &images);
        assert_eq!(result.err().as_deref(), Some("mesh data is not loaded"));
    }

    #[test]
    fn textured_model_is_prepared_in_world_space() {
        use bevy::asset::RenderAssetUsages;
        use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

        let mut images = Assets::<Image>::default();
        let texture = images.add(Image::new(
            Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![255, 0, 0, 255],
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        ));
        let material = StandardMaterial {
            base_color_texture: Some(texture),
            ..default()
        };
        let mesh = Mesh::from(Cuboid::default());
        let transform = Transform::from_xyz(0.0, 0.0, -15.0);

        let (tri_mesh, sampler) =
            prepare_projection(Some(&mesh), &transform, Some(&material), &images).unwrap();
        assert_eq!(tri_mesh.triangle_count(), 12);
        assert!(tri_mesh.positions.iter().all(|p| (p.z + 15.0).abs() <= 0.5 + 1e-5));
        assert_eq!(sampler.sample(Vec2::splat(0.5)), Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn progress_logged_once_per_interval() {
        let mut log = LoadProgressLog::default();
        let step = LOAD_PROGRESS_INTERVAL / 4.0;
        let due: Vec<bool> = (0..8).map(|_| log.tick(step)).collect();
        assert_eq!(due.iter().filter(|d| **d).count(), 2);
        assert!(due[3] && due[7]);
        assert!((log.waited() - LOAD_PROGRESS_INTERVAL * 2.0).abs() < 1e-5);
    }

    fn model_app(asset_root: &std::path::Path, model_path: &str) -> App {
        let mut settings = ViewerSettings::default();
        settings.model_path = model_path.to_string();

        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            bevy::asset::AssetPlugin {
                file_path: asset_root.display().to_string(),
                watch_for_changes_override: Some(false),
                ..default()
            },
        ))
        .init_asset::<Image>()
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .init_asset::<Gltf>()
        .init_asset::<GltfMesh>()
        .init_asset::<GltfNode>()
        .init_resource::<ModelState>()
        .init_resource::<SamplingGeometry>()
        .init_resource::<ProjectionConfig>()
        .init_resource::<ProjectionCanvases>()
        .insert_resource(CurrentSettings::new(settings))
        .add_systems(Startup, request_model)
        .add_systems(Update, poll_model_load.run_if(resource_exists::<PendingModel>));
        app
    }

    #[test]
    fn missing_model_fails_and_stops_polling() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("spheremap_assets_{}", nanos));
        std::fs::create_dir_all(&root).unwrap();

        let mut app = model_app(&root, "models/missing.gltf");
        for _ in 0..500 {
            app.update();
            if app.world().resource::<ModelState>().is_settled() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert!(matches!(
            app.world().resource::<ModelState>(),
            ModelState::Failed(_)
        ));
        app.update();
        assert!(!app.world().contains_resource::<PendingModel>());
        assert!(matches!(
            app.world().resource::<ModelState>(),
            ModelState::Failed(_)
        ));
        let mut models = app.world_mut().query::<&ModelMesh>();
        assert_eq!(models.iter(app.world()).count(), 0);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn only_loading_state_is_unsettled() {
        assert!(!ModelState::Loading.is_settled());
        assert!(ModelState::Failed("x".into()).is_settled());
        assert!(ModelState::Unprojected("x".into()).is_settled());
        assert!(ModelState::Projected(ProjectionSummary::default()).is_settled());
    }
}
