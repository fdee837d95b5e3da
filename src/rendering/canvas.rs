//! Owned raster surface the compositor draws each chunk into.
//!
//! All drawing is source-over alpha blending onto an [`RgbaImage`]. Shapes are
//! rasterized by pixel center and clipped to the surface, so callers may pass
//! rectangles that hang over the edge.

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rand::Rng;

/// A rectangular pixel region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn square(origin: UVec2, size: u32) -> Self {
        Self::new(origin.x, origin.y, size, size)
    }

    /// Clamps this rect to fit within the given bounds.
    fn clamped(&self, bound_width: u32, bound_height: u32) -> Self {
        let x = self.x.min(bound_width);
        let y = self.y.min(bound_height);
        Self {
            x,
            y,
            width: self.width.min(bound_width - x),
            height: self.height.min(bound_height - y),
        }
    }

    fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }
}

pub struct ChunkCanvas {
    pixels: RgbaImage,
}

impl ChunkCanvas {
    /// Creates a transparent square surface.
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::new(size, size),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    /// Draws `source` stretched over `cell` with the given opacity.
    pub fn draw_image(&mut self, source: &RgbaImage, cell: PixelRect, opacity: f32) {
        if cell.width == 0 || cell.height == 0 {
            return;
        }
        let scaled;
        let source = if source.dimensions() == (cell.width, cell.height) {
            source
        } else {
            scaled = imageops::resize(source, cell.width, cell.height, FilterType::Triangle);
            &scaled
        };

        let clip = cell.clamped(self.width(), self.height());
        for y in 0..clip.height {
            for x in 0..clip.width {
                let src = with_opacity(*source.get_pixel(x, y), opacity);
                blend_over(self.pixels.get_pixel_mut(clip.x + x, clip.y + y), src);
            }
        }
    }

    /// Fills a pixel-aligned rectangle.
    pub fn fill_cell(&mut self, cell: PixelRect, color: Rgba<u8>, opacity: f32) {
        let clip = cell.clamped(self.width(), self.height());
        let src = with_opacity(color, opacity);
        for y in clip.y..clip.y + clip.height {
            for x in clip.x..clip.x + clip.width {
                blend_over(self.pixels.get_pixel_mut(x, y), src);
            }
        }
    }

    /// Fills the pixels whose centers lie in `[x, x+width) × [y, y+height)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let first_col = (x - 0.5).ceil().max(0.0);
        let first_row = (y - 0.5).ceil().max(0.0);
        let end_col = (x + width - 0.5).ceil().max(0.0);
        let end_row = (y + height - 0.5).ceil().max(0.0);
        if end_col <= first_col || end_row <= first_row {
            return;
        }

        let rect = PixelRect::new(
            first_col as u32,
            first_row as u32,
            (end_col - first_col) as u32,
            (end_row - first_row) as u32,
        );
        self.fill_cell(rect, color, 1.0);
    }

    /// Blends a radial falloff over `cell`: `peak_alpha` at the center fading to
    /// zero at `radius` pixels.
    pub fn radial_gradient(&mut self, cell: PixelRect, radius: f32, color: Rgba<u8>, peak_alpha: f32) {
        if radius <= 0.0 || peak_alpha <= 0.0 {
            return;
        }
        let center = cell.center();
        let clip = cell.clamped(self.width(), self.height());
        for y in clip.y..clip.y + clip.height {
            for x in clip.x..clip.x + clip.width {
                let distance = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                let falloff = (1.0 - distance / radius).max(0.0);
                if falloff > 0.0 {
                    let src = with_opacity(color, peak_alpha * falloff);
                    blend_over(self.pixels.get_pixel_mut(x, y), src);
                }
            }
        }
    }

    /// Offsets each color channel of every pixel in `cell` by a uniform draw
    /// from `[-intensity/2, intensity/2]`. Alpha is left untouched.
    pub fn perturb<R: Rng>(&mut self, cell: PixelRect, intensity: f32, rng: &mut R) {
        let half = intensity.abs() * 0.5;
        if half == 0.0 || !half.is_finite() {
            return;
        }
        let clip = cell.clamped(self.width(), self.height());
        for y in clip.y..clip.y + clip.height {
            for x in clip.x..clip.x + clip.width {
                let pixel = self.pixels.get_pixel_mut(x, y);
                for channel in &mut pixel.0[..3] {
                    let offset: f32 = rng.random_range(-half..=half);
                    *channel = (*channel as f32 + offset).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    /// Copies the surface into a GPU-ready image with repeat addressing.
    ///
    /// Row 0 of the surface is V = 0, so no vertical flip is applied.
    pub fn snapshot(&self) -> Image {
        let size = Extent3d {
            width: self.width(),
            height: self.height(),
            depth_or_array_layers: 1,
        };

        let mut image = Image::new(
            size,
            TextureDimension::D2,
            self.pixels.as_raw().clone(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        );
        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::Repeat,
            address_mode_v: ImageAddressMode::Repeat,
            address_mode_w: ImageAddressMode::Repeat,
            ..default()
        });
        image
    }
}

/// Source-over compositing with round-to-nearest channels.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_a = src[3] as f32 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    if src[3] == 255 {
        *dst = src;
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for i in 0..3 {
        let c = (src[i] as f32 * src_a + dst[i] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

fn with_opacity(color: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let alpha = (color[3] as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Rgba([color[0], color[1], color[2], alpha])
}
