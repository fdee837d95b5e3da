use bevy::prelude::*;

/// Grid addressing shared by the compositor (pixel cells) and the mesh builder (UV cells).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AtlasLayout {
    pub tiles_per_side: u32,
    pub tile_resolution: u32,
}

/// Texture-space rectangle of one atlas cell, top-left origin.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl AtlasLayout {
    pub fn new(tiles_per_side: u32, tile_resolution: u32) -> Self {
        Self {
            tiles_per_side,
            tile_resolution,
        }
    }

    /// Edge length of the atlas in pixels.
    pub fn size(&self) -> u32 {
        self.tiles_per_side * self.tile_resolution
    }

    /// Top-left pixel of the cell for tile `(x, z)`.
    pub fn cell_origin(&self, x: usize, z: usize) -> UVec2 {
        UVec2::new(x as u32 * self.tile_resolution, z as u32 * self.tile_resolution)
    }
}

/// UV rectangle `[x/n, z/n]..[(x+1)/n, (z+1)/n]` for tile `(x, z)` of an `n`-tile chunk.
pub fn tile_uv_rect(x: usize, z: usize, tiles: usize) -> UvRect {
    let n = tiles as f32;
    UvRect {
        min: Vec2::new(x as f32 / n, z as f32 / n),
        max: Vec2::new((x + 1) as f32 / n, (z + 1) as f32 / n),
    }
}
