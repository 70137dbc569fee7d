//! Scene setup, canvas upload, visibility and helper gizmos

use bevy::prelude::*;

use crate::camera::OrbitCamera;
use crate::constants::*;
use crate::model::{DebugRays, HitMarker, ModelMesh, RayGroup, default_sampling_sphere};
use crate::projection::{CanvasSet, ProjectionPlane, ProjectionSetup, SamplingSphere};
use crate::settings::{CurrentSettings, VisibilityToggles};

/// Marker for the sampling sphere entity
#[derive(Component)]
pub struct SamplingSphereMesh;

/// Marker for the perspective plane entity
#[derive(Component)]
pub struct PerspectivePlaneMesh;

/// Marker for the stereographic plane entity
#[derive(Component)]
pub struct StereographicPlaneMesh;

/// Sphere whose vertices are projected
#[derive(Resource)]
pub struct SamplingGeometry(pub SamplingSphere);

impl Default for SamplingGeometry {
    fn default() -> Self {
        Self(default_sampling_sphere())
    }
}

/// Planes, pole and block sizes of the projection pass
#[derive(Resource, Default)]
pub struct ProjectionConfig(pub ProjectionSetup);

/// CPU canvases and the GPU images they are uploaded into
#[derive(Resource)]
pub struct ProjectionCanvases {
    pub set: CanvasSet,
    pub sphere_image: Handle<Image>,
    pub perspective_image: Handle<Image>,
    pub stereographic_image: Handle<Image>,
}

impl FromWorld for ProjectionCanvases {
    fn from_world(world: &mut World) -> Self {
        let set = CanvasSet::default();
        let mut images = world.resource_mut::<Assets<Image>>();
        Self {
            sphere_image: images.add(set.sphere.to_image()),
            perspective_image: images.add(set.perspective.to_image()),
            stereographic_image: images.add(set.stereographic.to_image()),
            set,
        }
    }
}

fn visibility_from(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Unlit, double sided, alpha blended material showing a canvas
fn canvas_material(image: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(image),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

/// Spawn camera, light, sampling sphere and projection planes
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    canvases: Res<ProjectionCanvases>,
    geometry: Res<SamplingGeometry>,
    config: Res<ProjectionConfig>,
    current_settings: Res<CurrentSettings>,
) {
    let orbit = OrbitCamera::looking_at(Vec3::ZERO, CAMERA_START_DISTANCE);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        orbit.transform(),
        orbit,
    ));

    // The model uses lit glTF materials; everything else is unlit
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            ..default()
        },
        Transform::from_xyz(2.0, 4.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let toggles = &current_settings.settings.visibility;

    commands.spawn((
        Mesh3d(meshes.add(geometry.0.to_mesh())),
        MeshMaterial3d(materials.add(canvas_material(canvases.sphere_image.clone()))),
        Transform::IDENTITY,
        visibility_from(toggles.sphere),
        SamplingSphereMesh,
    ));

    let planes: [(ProjectionPlane, Handle<Image>, bool); 2] = [
        (
            config.0.perspective_plane,
            canvases.perspective_image.clone(),
            toggles.perspective_plane,
        ),
        (
            config.0.stereographic_plane,
            canvases.stereographic_image.clone(),
            toggles.stereographic_plane,
        ),
    ];
    for (index, (plane, image, visible)) in planes.into_iter().enumerate() {
        let mut entity = commands.spawn((
            Mesh3d(meshes.add(plane.to_mesh())),
            MeshMaterial3d(materials.add(canvas_material(image))),
            Transform::IDENTITY,
            visibility_from(visible),
        ));
        if index == 0 {
            entity.insert(PerspectivePlaneMesh);
        } else {
            entity.insert(StereographicPlaneMesh);
        }
    }
}

/// Copy canvases into their GPU images whenever they change
pub fn upload_canvases(canvases: Res<ProjectionCanvases>, mut images: ResMut<Assets<Image>>) {
    if !canvases.is_changed() {
        return;
    }

    let pairs = [
        (&canvases.set.sphere, &canvases.sphere_image),
        (&canvases.set.perspective, &canvases.perspective_image),
        (&canvases.set.stereographic, &canvases.stereographic_image),
    ];
    for (canvas, handle) in pairs {
        if let Some(image) = images.get_mut(handle) {
            canvas.upload_to(image);
        }
    }
}

/// Apply the toggle states to scene entities
#[allow(clippy::type_complexity)]
pub fn sync_visibility(
    current_settings: Res<CurrentSettings>,
    mut model: Query<&mut Visibility, With<ModelMesh>>,
    mut sphere: Query<&mut Visibility, (With<SamplingSphereMesh>, Without<ModelMesh>)>,
    mut perspective: Query<
        &mut Visibility,
        (
            With<PerspectivePlaneMesh>,
            Without<ModelMesh>,
            Without<SamplingSphereMesh>,
        ),
    >,
    mut stereographic: Query<
        &mut Visibility,
        (
            With<StereographicPlaneMesh>,
            Without<ModelMesh>,
            Without<SamplingSphereMesh>,
            Without<PerspectivePlaneMesh>,
        ),
    >,
    mut markers: Query<
        &mut Visibility,
        (
            With<HitMarker>,
            Without<ModelMesh>,
            Without<SamplingSphereMesh>,
            Without<PerspectivePlaneMesh>,
            Without<StereographicPlaneMesh>,
        ),
    >,
) {
    if !current_settings.is_changed() {
        return;
    }
    let toggles = &current_settings.settings.visibility;

    for mut v in &mut model {
        v.set_if_neq(visibility_from(toggles.mesh));
    }
    for mut v in &mut sphere {
        v.set_if_neq(visibility_from(toggles.sphere));
    }
    for mut v in &mut perspective {
        v.set_if_neq(visibility_from(toggles.perspective_plane));
    }
    for mut v in &mut stereographic {
        v.set_if_neq(visibility_from(toggles.stereographic_plane));
    }
    for mut v in &mut markers {
        v.set_if_neq(visibility_from(toggles.sphere_rays));
    }
}

/// Axes at the origin and a unit grid on the XZ plane
pub fn draw_helpers(mut gizmos: Gizmos) {
    gizmos.line(Vec3::ZERO, Vec3::X * AXES_LENGTH, Color::srgb(1.0, 0.0, 0.0));
    gizmos.line(Vec3::ZERO, Vec3::Y * AXES_LENGTH, Color::srgb(0.0, 1.0, 0.0));
    gizmos.line(Vec3::ZERO, Vec3::Z * AXES_LENGTH, Color::srgb(0.0, 0.0, 1.0));

    let half = GRID_UNITS as f32 / 2.0;
    for i in 0..=GRID_UNITS {
        let offset = i as f32 - half;
        gizmos.line(Vec3::new(offset, 0.0, -half), Vec3::new(offset, 0.0, half), GRID_COLOR);
        gizmos.line(Vec3::new(-half, 0.0, offset), Vec3::new(half, 0.0, offset), GRID_COLOR);
    }
}

fn ray_group_visible(toggles: &VisibilityToggles, group: RayGroup) -> bool {
    match group {
        RayGroup::Sphere => toggles.sphere_rays,
        RayGroup::Perspective => toggles.perspective_rays,
        RayGroup::Stereographic => toggles.stereographic_rays,
    }
}

fn ray_group_color(group: RayGroup) -> Color {
    match group {
        RayGroup::Sphere => SPHERE_RAY_COLOR,
        RayGroup::Perspective => PERSPECTIVE_RAY_COLOR,
        RayGroup::Stereographic => STEREOGRAPHIC_RAY_COLOR,
    }
}

/// Draw the rays recorded by the projection pass
pub fn draw_debug_rays(
    debug_rays: Option<Res<DebugRays>>,
    current_settings: Res<CurrentSettings>,
    mut gizmos: Gizmos,
) {
    let Some(debug_rays) = debug_rays else {
        return;
    };
    let toggles = &current_settings.settings.visibility;
    for ray in &debug_rays.rays {
        if ray_group_visible(toggles, ray.group) {
            gizmos.line(ray.start, ray.end, ray_group_color(ray.group));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetPlugin;

    fn canvas_app() -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                watch_for_changes_override: Some(false),
                ..default()
            },
        ))
            .init_asset::<Image>()
            .init_resource::<ProjectionCanvases>()
            .add_systems(Update, upload_canvases);
        app
    }

    #[test]
    fn canvases_start_as_gpu_images() {
        let app = canvas_app();
        let canvases = app.world().resource::<ProjectionCanvases>();
        let images = app.world().resource::<Assets<Image>>();
        let image = images.get(&canvases.sphere_image).expect("sphere image");
        assert_eq!(image.width(), SPHERE_CANVAS_SIZE);
        assert_eq!(image.data.as_deref(), Some(canvases.set.sphere.as_raw()));
    }

    #[test]
    fn changed_canvas_is_uploaded() {
        let mut app = canvas_app();
        app.update();

        app.world_mut()
            .resource_mut::<ProjectionCanvases>()
            .set
            .perspective
            .fill_block(0, 0, 4, [9, 8, 7, 255]);
        app.update();

        let canvases = app.world().resource::<ProjectionCanvases>();
        let images = app.world().resource::<Assets<Image>>();
        let image = images.get(&canvases.perspective_image).unwrap();
        let data = image.data.as_deref().unwrap();
        assert_eq!(&data[..4], &[9, 8, 7, 255]);
    }

    #[test]
    fn ray_groups_follow_their_toggle() {
        let mut toggles = VisibilityToggles::default();
        toggles.perspective_rays = false;
        assert!(ray_group_visible(&toggles, RayGroup::Sphere));
        assert!(!ray_group_visible(&toggles, RayGroup::Perspective));
        assert!(ray_group_visible(&toggles, RayGroup::Stereographic));
    }
}
