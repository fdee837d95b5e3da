//! Per-tile paint steps, applied to a cell in [`LAYER_ORDER`].

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{LIGHTING_STRENGTH, WATER_OPACITY};
use crate::rendering::canvas::{ChunkCanvas, PixelRect};
use crate::terrain::chunk::ChunkKey;
use crate::terrain::types::{Road, RoadDirection, Speckle};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Layer {
    Base,
    Water,
    Lighting,
    Noise,
    Speckles,
    Roads,
}

/// Each layer blends over everything painted before it.
pub const LAYER_ORDER: [Layer; 6] = [
    Layer::Base,
    Layer::Water,
    Layer::Lighting,
    Layer::Noise,
    Layer::Speckles,
    Layer::Roads,
];

/// Draws the base texture, or a flat fill when it could not be resolved.
pub fn paint_base(canvas: &mut ChunkCanvas, cell: PixelRect, texture: Option<&RgbaImage>, fallback: Rgba<u8>) {
    match texture {
        Some(texture) => canvas.draw_image(texture, cell, 1.0),
        None => canvas.fill_cell(cell, fallback, 1.0),
    }
}

/// Redraws the top texture translucently as a water sheen.
pub fn paint_water(canvas: &mut ChunkCanvas, cell: PixelRect, texture: Option<&RgbaImage>, fallback: Rgba<u8>) {
    match texture {
        Some(texture) => canvas.draw_image(texture, cell, WATER_OPACITY),
        None => canvas.fill_cell(cell, fallback, WATER_OPACITY),
    }
}

/// Radial highlight reaching one tile width from the cell center.
pub fn paint_lighting(canvas: &mut ChunkCanvas, cell: PixelRect, lighting: f32, color: Rgba<u8>) {
    let peak = lighting.clamp(0.0, 1.0) * LIGHTING_STRENGTH;
    canvas.radial_gradient(cell, cell.width as f32, color, peak);
}

pub fn paint_noise(canvas: &mut ChunkCanvas, cell: PixelRect, intensity: f32, rng: &mut StdRng) {
    canvas.perturb(cell, intensity, rng);
}

/// Squares of side `2 * size` centered on each speckle position.
pub fn paint_speckles(canvas: &mut ChunkCanvas, cell: PixelRect, speckles: &[Speckle]) {
    let resolution = cell.width as f32;
    for speckle in speckles {
        let size = speckle.size();
        let cx = cell.x as f32 + speckle.x * resolution;
        let cy = cell.y as f32 + speckle.y * resolution;
        canvas.fill_rect(cx - size, cy - size, size * 2.0, size * 2.0, speckle.color().to_rgba());
    }
}

/// Strokes each road across the full cell through its midline.
pub fn paint_roads(canvas: &mut ChunkCanvas, cell: PixelRect, roads: &[Road]) {
    let left = cell.x as f32;
    let top = cell.y as f32;
    let resolution = cell.width as f32;
    let mid = resolution * 0.5;

    for road in roads {
        let width = road.width();
        let color = road.color().to_rgba();
        match road.direction {
            RoadDirection::Horizontal => {
                canvas.fill_rect(left, top + mid - width * 0.5, resolution, width, color)
            }
            RoadDirection::Vertical => {
                canvas.fill_rect(left + mid - width * 0.5, top, width, resolution, color)
            }
            RoadDirection::Unsupported => {}
        }
    }
}

/// Noise generator for one chunk, stable for a given key and base seed.
pub fn noise_rng(key: ChunkKey, base_seed: u64) -> StdRng {
    let mut seed = base_seed ^ 0x9e37_79b9_7f4a_7c15;
    for part in [key.x, key.y, key.r_order] {
        seed = (seed ^ part as u32 as u64).wrapping_mul(0x0100_0000_01b3);
        seed ^= seed >> 29;
    }
    StdRng::seed_from_u64(seed)
}
