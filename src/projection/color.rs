//! Color space conversion for texture samples
//!
//! Samples are read from the mesh texture as display (sRGB) values, converted
//! to linear for rendering, and re-encoded to sRGB bytes when painted into a
//! canvas (canvas images are sRGB textures).

use bevy::color::{LinearRgba, Srgba};

/// Normalized sRGB bytes -> linear color (alpha 1)
pub fn srgb_to_linear(rgb: [f32; 3]) -> LinearRgba {
    let clamped = rgb.map(|c| c.clamp(0.0, 1.0));
    LinearRgba::from(Srgba::rgb(clamped[0], clamped[1], clamped[2]))
}

/// Normalize RGBA8 texel channels to [0, 1] (alpha dropped)
pub fn texel_to_unit_rgb(texel: [u8; 4]) -> [f32; 3] {
    [
        texel[0] as f32 / 255.0,
        texel[1] as f32 / 255.0,
        texel[2] as f32 / 255.0,
    ]
}

/// Encode a linear color as opaque sRGB bytes for painting
pub fn linear_to_canvas_rgba8(color: LinearRgba) -> [u8; 4] {
    let srgb = Srgba::from(color);
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [quantize(srgb.red), quantize(srgb.green), quantize(srgb.blue), 255]
}
