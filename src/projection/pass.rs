//! The projection pass
//!
//! Every sampling sphere vertex casts a ray from the origin into the model.
//! Where the ray hits, the model's texture is sampled and the color is painted
//! into three canvases: the sphere's own uv layout, the perspective plane (same
//! ray) and the stereographic plane (ray from the pole through the vertex).
//!
//! Ray casts run in parallel; painting happens afterwards in vertex order so
//! overlapping blocks resolve the same way on every run.

use bevy::color::LinearRgba;
use bevy::math::Vec3;
use rayon::prelude::*;

use crate::canvas::Canvas;
use crate::constants::*;

use super::color::{linear_to_canvas_rgba8, srgb_to_linear};
use super::mesh::{MeshHit, TriMesh};
use super::plane::{PlaneHit, ProjectionPlane};
use super::ray::ray_through;
use super::sampler::TextureSampler;
use super::sphere::SamplingSphere;
use super::stereographic;

/// Fixed geometry of the pass
#[derive(Debug, Clone)]
pub struct ProjectionSetup {
    pub origin: Vec3,
    pub pole: Vec3,
    pub perspective_plane: ProjectionPlane,
    pub stereographic_plane: ProjectionPlane,
    pub sphere_block: u32,
    pub plane_block: u32,
}

impl Default for ProjectionSetup {
    fn default() -> Self {
        Self {
            origin: PROJECTION_ORIGIN,
            pole: STEREOGRAPHIC_POLE,
            perspective_plane: ProjectionPlane::perspective(),
            stereographic_plane: ProjectionPlane::stereographic(),
            sphere_block: SPHERE_BLOCK_SIZE,
            plane_block: PLANE_BLOCK_SIZE,
        }
    }
}

/// The three painted textures
#[derive(Clone)]
pub struct CanvasSet {
    pub sphere: Canvas,
    pub perspective: Canvas,
    pub stereographic: Canvas,
}

impl Default for CanvasSet {
    fn default() -> Self {
        Self {
            sphere: Canvas::with_grid(SPHERE_CANVAS_SIZE, GRID_LINES, CANVAS_BACKGROUND, GRID_LINE_COLOR),
            perspective: Canvas::with_grid(PLANE_CANVAS_SIZE, GRID_LINES, CANVAS_BACKGROUND, GRID_LINE_COLOR),
            stereographic: Canvas::with_grid(PLANE_CANVAS_SIZE, GRID_LINES, CANVAS_BACKGROUND, GRID_LINE_COLOR),
        }
    }
}

/// A vertex whose origin ray hit the model and produced a color
#[derive(Debug, Clone, Copy)]
pub struct ProjectedSample {
    pub vertex: usize,
    pub color: LinearRgba,
    pub mesh_hit: MeshHit,
    pub perspective: Option<PlaneHit>,
    pub stereographic: Option<PlaneHit>,
}

enum VertexResult {
    Miss,
    Unsampled,
    Sampled(ProjectedSample),
}

/// Per-target paint counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintCounts {
    pub sphere: usize,
    pub perspective: usize,
    pub stereographic: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectionOutcome {
    pub samples: Vec<ProjectedSample>,
    /// Vertices whose ray missed the model
    pub misses: usize,
    /// Vertices whose hit uv fell outside the texture
    pub unsampled: usize,
    pub painted: PaintCounts,
}

fn project_vertex(
    index: usize,
    position: Vec3,
    mesh: &TriMesh,
    texture: &TextureSampler,
    setup: &ProjectionSetup,
) -> VertexResult {
    let Some(ray) = ray_through(setup.origin, position) else {
        return VertexResult::Miss;
    };
    let Some(mesh_hit) = mesh.cast_ray(&ray) else {
        return VertexResult::Miss;
    };
    let Some(rgb) = texture.sample(mesh_hit.uv) else {
        return VertexResult::Unsampled;
    };

    VertexResult::Sampled(ProjectedSample {
        vertex: index,
        color: srgb_to_linear(rgb),
        mesh_hit,
        perspective: setup.perspective_plane.intersect(&ray),
        stereographic: stereographic::project(setup.pole, position, &setup.stereographic_plane),
    })
}

/// Run the pass once and paint into `canvases`.
/// Vertices that miss, or land outside a target, leave that target untouched.
pub fn run_projection(
    sphere: &SamplingSphere,
    mesh: &TriMesh,
    texture: &TextureSampler,
    setup: &ProjectionSetup,
    canvases: &mut CanvasSet,
) -> ProjectionOutcome {
    let results: Vec<VertexResult> = sphere
        .positions
        .par_iter()
        .enumerate()
        .map(|(index, &position)| project_vertex(index, position, mesh, texture, setup))
        .collect();

    let mut outcome = ProjectionOutcome::default();
    for result in results {
        let sample = match result {
            VertexResult::Miss => {
                outcome.misses += 1;
                continue;
            }
            VertexResult::Unsampled => {
                outcome.unsampled += 1;
                continue;
            }
            VertexResult::Sampled(sample) => sample,
        };

        let paint = linear_to_canvas_rgba8(sample.color);
        if canvases
            .sphere
            .paint_uv(sphere.uvs[sample.vertex], setup.sphere_block, paint)
        {
            outcome.painted.sphere += 1;
        }
        if let Some(hit) = sample.perspective
            && canvases.perspective.paint_uv(hit.uv, setup.plane_block, paint)
        {
            outcome.painted.perspective += 1;
        }
        if let Some(hit) = sample.stereographic
            && canvases.stereographic.paint_uv(hit.uv, setup.plane_block, paint)
        {
            outcome.painted.stereographic += 1;
        }
        outcome.samples.push(sample);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec2;
    use image::{Rgba, RgbaImage};

    /// Square quad facing the origin at depth `z`, uv covering [0, 1]^2
    fn wall(z: f32, half: f32) -> TriMesh {
        TriMesh::new(
            vec![
                Vec3::new(-half, -half, z),
                Vec3::new(half, -half, z),
                Vec3::new(half, half, z),
                Vec3::new(-half, half, z),
            ],
            vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn solid_texture(color: [u8; 4]) -> TextureSampler {
        TextureSampler::new(RgbaImage::from_pixel(4, 4, Rgba(color)))
    }

    #[test]
    fn empty_mesh_leaves_every_canvas_untouched() {
        let sphere = SamplingSphere::new(1.0, 16, 12);
        let mut canvases = CanvasSet::default();
        let before = canvases.clone();

        let outcome = run_projection(
            &sphere,
            &TriMesh::default(),
            &solid_texture([255, 0, 0, 255]),
            &ProjectionSetup::default(),
            &mut canvases,
        );

        assert_eq!(outcome.misses, sphere.vertex_count());
        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.painted, PaintCounts::default());
        assert_eq!(canvases.sphere.as_raw(), before.sphere.as_raw());
        assert_eq!(canvases.perspective.as_raw(), before.perspective.as_raw());
        assert_eq!(canvases.stereographic.as_raw(), before.stereographic.as_raw());
    }

    #[test]
    fn wall_in_front_paints_sampled_color() {
        let sphere = SamplingSphere::new(1.0, 24, 16);
        let mut canvases = CanvasSet::default();
        let red = [255, 0, 0, 255];

        let outcome = run_projection(
            &sphere,
            &wall(-15.0, 100.0),
            &solid_texture(red),
            &ProjectionSetup::default(),
            &mut canvases,
        );

        // Only vertices facing -Z reach the wall
        for sample in &outcome.samples {
            assert!(sphere.positions[sample.vertex].z < 0.0);
        }
        assert_eq!(
            outcome.samples.len() + outcome.misses + outcome.unsampled,
            sphere.vertex_count()
        );
        assert_eq!(outcome.painted.sphere, outcome.samples.len());
        assert!(outcome.painted.perspective > 0);
        assert!(outcome.painted.perspective < outcome.samples.len());
        assert!(outcome.painted.stereographic > 0);

        let sample = outcome.samples[0];
        let (x, y) = canvases
            .sphere
            .uv_to_pixel(sphere.uvs[sample.vertex])
            .unwrap();
        assert_eq!(canvases.sphere.pixel(x, y), red);
    }

    #[test]
    fn plane_misses_do_not_mark_plane_canvases() {
        let sphere = SamplingSphere::new(1.0, 24, 16);
        let mut canvases = CanvasSet::default();
        let before = canvases.clone();
        let setup = ProjectionSetup {
            perspective_plane: ProjectionPlane::facing_viewer(Vec3::new(0.0, 0.0, 30.0), Vec2::ONE),
            stereographic_plane: ProjectionPlane::facing_viewer(Vec3::new(0.0, 0.0, 30.0), Vec2::ONE),
            ..Default::default()
        };

        let outcome = run_projection(
            &sphere,
            &wall(-15.0, 100.0),
            &solid_texture([0, 255, 0, 255]),
            &setup,
            &mut canvases,
        );

        assert!(outcome.painted.sphere > 0);
        assert_eq!(outcome.painted.perspective, 0);
        assert_eq!(outcome.painted.stereographic, 0);
        assert_eq!(canvases.perspective.as_raw(), before.perspective.as_raw());
        assert_eq!(canvases.stereographic.as_raw(), before.stereographic.as_raw());
    }

    #[test]
    fn hits_outside_texture_are_counted_not_painted() {
        let sphere = SamplingSphere::new(1.0, 12, 8);
        let mut wall = wall(-15.0, 100.0);
        for uv in &mut wall.uvs {
            *uv += Vec2::splat(5.0);
        }
        let mut canvases = CanvasSet::default();
        let before = canvases.clone();

        let outcome = run_projection(
            &sphere,
            &wall,
            &solid_texture([0, 0, 255, 255]),
            &ProjectionSetup::default(),
            &mut canvases,
        );

        assert!(outcome.unsampled > 0);
        assert!(outcome.samples.is_empty());
        assert_eq!(canvases.sphere.as_raw(), before.sphere.as_raw());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let sphere = SamplingSphere::new(1.0, 32, 24);
        let texture = TextureSampler::new(RgbaImage::from_fn(8, 8, |x, y| {
            Rgba([(x * 30) as u8, (y * 30) as u8, 90, 255])
        }));
        let mesh = wall(-15.0, 40.0);

        let mut first = CanvasSet::default();
        let mut second = CanvasSet::default();
        run_projection(&sphere, &mesh, &texture, &ProjectionSetup::default(), &mut first);
        run_projection(&sphere, &mesh, &texture, &ProjectionSetup::default(), &mut second);

        assert_eq!(first.sphere.as_raw(), second.sphere.as_raw());
        assert_eq!(first.perspective.as_raw(), second.perspective.as_raw());
        assert_eq!(first.stereographic.as_raw(), second.stereographic.as_raw());
    }
}
