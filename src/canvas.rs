//! Canvas textures painted by the projection pass
//!
//! A canvas is a square RGBA8 buffer. UV (0, 0) is the bottom-left corner and
//! pixel rows run top to bottom, so v is flipped when mapping to pixels.

use bevy::asset::RenderAssetUsages;
use bevy::image::Image;
use bevy::math::Vec2;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

#[derive(Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Blank canvas filled with `background`
    pub fn new(size: u32, background: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(size, size, Rgba(background)),
        }
    }

    /// Canvas with `lines` evenly spaced 1px grid lines on both axes
    pub fn with_grid(size: u32, lines: u32, background: [u8; 4], line_color: [u8; 4]) -> Self {
        let mut canvas = Self::new(size, background);
        canvas.paint_grid(lines, line_color);
        canvas
    }

    /// Line i sits at floor(i * size / lines), for i in 0..lines
    pub fn paint_grid(&mut self, lines: u32, color: [u8; 4]) {
        let (width, height) = self.image.dimensions();
        for i in 0..lines {
            let x = (i as u64 * width as u64 / lines as u64) as i32;
            draw_filled_rect_mut(&mut self.image, Rect::at(x, 0).of_size(1, height), Rgba(color));
        }
        for i in 0..lines {
            let y = (i as u64 * height as u64 / lines as u64) as i32;
            draw_filled_rect_mut(&mut self.image, Rect::at(0, y).of_size(width, 1), Rgba(color));
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Pixel containing `uv`, or None outside [0, 1]^2
    pub fn uv_to_pixel(&self, uv: Vec2) -> Option<(u32, u32)> {
        if !uv.is_finite() || !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
            return None;
        }
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let x = ((uv.x * width as f32).floor() as u32).min(width - 1);
        let y = (((1.0 - uv.y) * height as f32).floor() as u32).min(height - 1);
        Some((x, y))
    }

    /// UV at the center of pixel (x, y)
    pub fn pixel_center_uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.image.width() as f32,
            1.0 - (y as f32 + 0.5) / self.image.height() as f32,
        )
    }

    /// Fill a size x size block with its top-left corner at (x, y), clipped to the canvas
    pub fn fill_block(&mut self, x: u32, y: u32, size: u32, color: [u8; 4]) {
        if size == 0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(x as i32, y as i32).of_size(size, size),
            Rgba(color),
        );
    }

    /// Paint a block at the pixel holding `uv`. Returns false when uv is out of range.
    pub fn paint_uv(&mut self, uv: Vec2, block_size: u32, color: [u8; 4]) -> bool {
        let Some((x, y)) = self.uv_to_pixel(uv) else {
            return false;
        };
        self.fill_block(x, y, block_size, color);
        true
    }

    /// GPU image initialized with this canvas's pixels
    pub fn to_image(&self) -> Image {
        Image::new(
            Extent3d {
                width: self.image.width(),
                height: self.image.height(),
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.image.as_raw().clone(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        )
    }

    /// Copy pixels into an existing image of the same size
    pub fn upload_to(&self, image: &mut Image) {
        image.data = Some(self.image.as_raw().clone());
    }

    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        self.image.save(path)
    }
}
