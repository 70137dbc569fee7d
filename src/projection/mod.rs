//! Projection math - rays, sampling sphere, planes, texture sampling and the pass itself
//!
//! Nothing in here touches the ECS; the Bevy side lives in `model` and `scene`.

mod color;
mod mesh;
mod pass;
mod plane;
mod ray;
mod sampler;
mod sphere;
pub mod stereographic;

pub use color::*;
pub use mesh::*;
pub use pass::*;
pub use plane::*;
pub use ray::*;
pub use sampler::*;
pub use sphere::*;
