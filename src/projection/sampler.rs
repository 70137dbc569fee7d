//! Nearest-texel sampling of the model's diffuse texture

use bevy::image::Image;
use bevy::math::Vec2;
use image::RgbaImage;
use std::fmt;

use super::color::texel_to_unit_rgb;

/// Why a material's texture cannot be sampled
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    NoBaseColorTexture,
    TextureNotLoaded,
    /// Pixel format the image crate cannot represent
    Unreadable(String),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::NoBaseColorTexture => write!(f, "material has no base color texture"),
            SampleError::TextureNotLoaded => write!(f, "base color texture is not loaded"),
            SampleError::Unreadable(reason) => write!(f, "cannot read base color texture: {}", reason),
        }
    }
}

impl std::error::Error for SampleError {}

/// Read-only view over a decoded RGBA8 texture.
/// UV (0, 0) is the first pixel of the first row (glTF convention).
pub struct TextureSampler {
    image: RgbaImage,
}

impl TextureSampler {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode a loaded Bevy image into RGBA8
    pub fn from_bevy_image(image: &Image) -> Result<Self, SampleError> {
        let dynamic = image
            .clone()
            .try_into_dynamic()
            .map_err(|e| SampleError::Unreadable(e.to_string()))?;
        Ok(Self::new(dynamic.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Texel holding `uv`, or None when uv falls outside [0, 1]^2.
    /// u or v of exactly 1.0 maps to the last texel.
    pub fn texel_for(&self, uv: Vec2) -> Option<(u32, u32)> {
        if self.image.width() == 0 || self.image.height() == 0 || !uv.is_finite() {
            return None;
        }
        if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
            return None;
        }
        let x = ((uv.x * self.image.width() as f32).floor() as u32).min(self.image.width() - 1);
        let y = ((uv.y * self.image.height() as f32).floor() as u32).min(self.image.height() - 1);
        Some((x, y))
    }

    /// Normalized display-space rgb at `uv`
    pub fn sample(&self, uv: Vec2) -> Option<[f32; 3]> {
        let (x, y) = self.texel_for(uv)?;
        Some(texel_to_unit_rgb(self.image.get_pixel(x, y).0))
    }
}
