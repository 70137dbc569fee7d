//! CPU triangle mesh for ray casting against the loaded model

use bevy::math::{Ray3d, Vec2, Vec3};
use bevy::mesh::{Mesh, PrimitiveTopology, VertexAttributeValues};
use bevy::transform::components::Transform;
use std::fmt;

use super::ray::intersect_triangle;

/// Why a render mesh could not be turned into a `TriMesh`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshExtractError {
    NotTriangleList,
    MissingPositions,
    MissingUvs,
    UnsupportedFormat(&'static str),
    LengthMismatch { positions: usize, uvs: usize },
    IndexOutOfRange(usize),
}

impl fmt::Display for MeshExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshExtractError::NotTriangleList => write!(f, "mesh topology is not a triangle list"),
            MeshExtractError::MissingPositions => write!(f, "mesh has no position attribute"),
            MeshExtractError::MissingUvs => write!(f, "mesh has no uv attribute"),
            MeshExtractError::UnsupportedFormat(attr) => {
                write!(f, "unsupported vertex format for {}", attr)
            }
            MeshExtractError::LengthMismatch { positions, uvs } => {
                write!(f, "{} positions but {} uvs", positions, uvs)
            }
            MeshExtractError::IndexOutOfRange(i) => write!(f, "index {} out of range", i),
        }
    }
}

impl std::error::Error for MeshExtractError {}

/// Nearest hit of a ray against a `TriMesh`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub distance: f32,
    pub point: Vec3,
    pub uv: Vec2,
    pub triangle: usize,
}

/// World-space triangle soup with per-vertex uvs
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<[usize; 3]>,
}

impl TriMesh {
    pub fn new(
        positions: Vec<Vec3>,
        uvs: Vec<Vec2>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, MeshExtractError> {
        if positions.len() != uvs.len() {
            return Err(MeshExtractError::LengthMismatch {
                positions: positions.len(),
                uvs: uvs.len(),
            });
        }
        if let Some(&bad) = triangles.iter().flatten().find(|&&i| i >= positions.len()) {
            return Err(MeshExtractError::IndexOutOfRange(bad));
        }
        Ok(Self {
            positions,
            uvs,
            triangles,
        })
    }

    /// Copy a render mesh into world space using `transform`.
    /// Non-indexed meshes are read as consecutive triangles.
    pub fn from_bevy_mesh(mesh: &Mesh, transform: &Transform) -> Result<Self, MeshExtractError> {
        if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
            return Err(MeshExtractError::NotTriangleList);
        }

        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => values
                .iter()
                .map(|&p| transform.transform_point(Vec3::from_array(p)))
                .collect::<Vec<_>>(),
            Some(_) => return Err(MeshExtractError::UnsupportedFormat("positions")),
            None => return Err(MeshExtractError::MissingPositions),
        };

        let uvs = match mesh.attribute(Mesh::ATTRIBUTE_UV_0) {
            Some(VertexAttributeValues::Float32x2(values)) => {
                values.iter().map(|&uv| Vec2::from_array(uv)).collect::<Vec<_>>()
            }
            Some(_) => return Err(MeshExtractError::UnsupportedFormat("uvs")),
            None => return Err(MeshExtractError::MissingUvs),
        };

        let flat: Vec<usize> = match mesh.indices() {
            Some(indices) => indices.iter().collect(),
            None => (0..positions.len()).collect(),
        };
        let triangles = flat
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        Self::new(positions, uvs, triangles)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Nearest intersection by linear scan over every triangle
    pub fn cast_ray(&self, ray: &Ray3d) -> Option<MeshHit> {
        let mut nearest: Option<MeshHit> = None;
        for (index, &[ia, ib, ic]) in self.triangles.iter().enumerate() {
            let Some(hit) = intersect_triangle(
                ray,
                self.positions[ia],
                self.positions[ib],
                self.positions[ic],
            ) else {
                continue;
            };
            if nearest.is_some_and(|n| n.distance <= hit.distance) {
                continue;
            }
            nearest = Some(MeshHit {
                distance: hit.distance,
                point: ray.get_point(hit.distance),
                uv: hit.interpolate(self.uvs[ia], self.uvs[ib], self.uvs[ic]),
                triangle: index,
            });
        }
        nearest
    }
}
