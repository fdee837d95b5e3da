//! Bakes every tile of a chunk into one atlas texture.
//!
//! The compositor owns a single reusable [`ChunkCanvas`] plus two caches:
//! decoded source images by identifier, and finished textures by
//! [`ChunkKey`]. Texture identity is purely positional, so editing a chunk's
//! tiles and asking again returns the cached texture until
//! [`ChunkTextureCompositor::invalidate_chunk`] is called.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;
use image::{Rgba, RgbaImage};
use log::{debug, warn};

use crate::config::baker::BakerConfig;
use crate::constants::{DEFAULT_FALLBACK_COLOR, DEFAULT_LIGHT_COLOR, DEFAULT_WATER_FALLBACK_COLOR};
use crate::rendering::atlas::AtlasLayout;
use crate::rendering::canvas::{ChunkCanvas, PixelRect};
use crate::rendering::images::{ImageCache, ImageLoadError, ImageSource};
use crate::rendering::layers::{self, Layer, LAYER_ORDER};
use crate::terrain::chunk::{ChunkBuildError, ChunkData, ChunkKey};
use crate::terrain::types::{DefaultTextureSet, TileDescriptor};

/// Immutable baked atlas, shared between the cache and its users.
pub type ChunkTexture = Arc<Image>;

pub struct ChunkTextureCompositor<S> {
    source: S,
    layout: AtlasLayout,
    fallback_color: Rgba<u8>,
    water_fallback_color: Rgba<u8>,
    light_color: Rgba<u8>,
    noise_seed: u64,
    canvas: Option<ChunkCanvas>,
    images: ImageCache,
    textures: HashMap<ChunkKey, ChunkTexture>,
}

/// Source images resolved for one tile before painting.
struct TileImages {
    base: Option<Arc<RgbaImage>>,
    water: Option<Arc<RgbaImage>>,
}

impl<S: ImageSource> ChunkTextureCompositor<S> {
    pub fn new(tiles_per_side: u32, tile_resolution: u32, source: S) -> Self {
        let layout = AtlasLayout::new(tiles_per_side, tile_resolution);
        Self {
            source,
            layout,
            fallback_color: Rgba(DEFAULT_FALLBACK_COLOR),
            water_fallback_color: Rgba(DEFAULT_WATER_FALLBACK_COLOR),
            light_color: Rgba(DEFAULT_LIGHT_COLOR),
            noise_seed: 0,
            canvas: Some(ChunkCanvas::new(layout.size())),
            images: ImageCache::default(),
            textures: HashMap::new(),
        }
    }

    pub fn from_config(config: &BakerConfig, source: S) -> Self {
        let mut compositor = Self::new(config.tiles_per_side, config.tile_resolution, source);
        compositor.fallback_color = config.fallback_color.to_rgba();
        compositor.water_fallback_color = config.water_fallback_color.to_rgba();
        compositor.light_color = config.light_color.to_rgba();
        compositor.noise_seed = config.noise_seed;
        compositor
    }

    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    pub fn fallback_color(&self) -> Rgba<u8> {
        self.fallback_color
    }

    pub fn is_disposed(&self) -> bool {
        self.canvas.is_none()
    }

    pub fn cached_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn cached_image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns a decoded image, fetching it from the source on first use.
    pub async fn resolve_image(&mut self, id: &str) -> Result<Arc<RgbaImage>, ChunkBuildError> {
        if self.is_disposed() {
            return Err(ChunkBuildError::Disposed);
        }
        Ok(self.fetch(id).await?)
    }

    async fn fetch(&mut self, id: &str) -> Result<Arc<RgbaImage>, ImageLoadError> {
        if let Some(image) = self.images.get(id) {
            return Ok(image);
        }
        let image = self.source.load(id).await?;
        Ok(self.images.insert(id, image))
    }

    /// Like `fetch`, but a failure only costs this layer its texture.
    async fn fetch_or_warn(&mut self, id: &str) -> Option<Arc<RgbaImage>> {
        match self.fetch(id).await {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Using fallback fill for texture {id}: {err}");
                None
            }
        }
    }

    async fn resolve_tile(&mut self, tile: &TileDescriptor, defaults: &DefaultTextureSet) -> TileImages {
        let base = self.fetch_or_warn(tile.base_texture(defaults)).await;
        let water = match (tile.is_water, tile.top.as_deref()) {
            (true, Some(top)) => self.fetch_or_warn(top).await,
            _ => None,
        };
        TileImages { base, water }
    }

    /// Bakes (or returns the cached) atlas texture for `chunk`.
    pub async fn generate_chunk_texture(&mut self, chunk: &ChunkData) -> Result<ChunkTexture, ChunkBuildError> {
        if self.is_disposed() {
            return Err(ChunkBuildError::Disposed);
        }

        let key = chunk.key();
        if let Some(texture) = self.textures.get(&key) {
            debug!("Chunk texture {key} served from cache");
            return Ok(texture.clone());
        }

        let tiles = chunk.validate()?;
        if tiles != self.layout.tiles_per_side as usize {
            return Err(ChunkBuildError::SizeMismatch {
                tiles,
                capacity: self.layout.tiles_per_side as usize,
            });
        }

        self.canvas
            .as_mut()
            .ok_or(ChunkBuildError::Disposed)?
            .clear();

        let noise = chunk.def_texture.noise_intensity();
        let mut rng = layers::noise_rng(key, self.noise_seed);

        for (x, z, tile) in chunk.tiles() {
            let images = self.resolve_tile(tile, &chunk.def_texture).await;
            let cell = PixelRect::square(self.layout.cell_origin(x, z), self.layout.tile_resolution);
            let canvas = self.canvas.as_mut().ok_or(ChunkBuildError::Disposed)?;

            for layer in LAYER_ORDER {
                match layer {
                    Layer::Base => layers::paint_base(canvas, cell, images.base.as_deref(), self.fallback_color),
                    Layer::Water if wants_water_overlay(tile) => {
                        layers::paint_water(canvas, cell, images.water.as_deref(), self.water_fallback_color)
                    }
                    Layer::Water => {}
                    Layer::Lighting => {
                        if let Some(lighting) = tile.lighting {
                            layers::paint_lighting(canvas, cell, lighting, self.light_color);
                        }
                    }
                    Layer::Noise => {
                        if let Some(intensity) = noise {
                            layers::paint_noise(canvas, cell, intensity, &mut rng);
                        }
                    }
                    Layer::Speckles => layers::paint_speckles(canvas, cell, &tile.speckles),
                    Layer::Roads => layers::paint_roads(canvas, cell, &tile.roads),
                }
            }
        }

        let canvas = self.canvas.as_ref().ok_or(ChunkBuildError::Disposed)?;
        let texture: ChunkTexture = Arc::new(canvas.snapshot());
        self.textures.insert(key, texture.clone());
        debug!("Baked chunk texture {key} ({} tiles)", chunk.tiles().count());
        Ok(texture)
    }

    /// Drops the cached texture for one chunk; returns whether one existed.
    pub fn invalidate_chunk(&mut self, key: ChunkKey) -> Result<bool, ChunkBuildError> {
        if self.is_disposed() {
            return Err(ChunkBuildError::Disposed);
        }
        Ok(self.textures.remove(&key).is_some())
    }

    /// Drops every cached image and texture.
    pub fn clear_cache(&mut self) -> Result<(), ChunkBuildError> {
        if self.is_disposed() {
            return Err(ChunkBuildError::Disposed);
        }
        self.images.clear();
        self.textures.clear();
        Ok(())
    }

    /// Releases the caches and the canvas. Every later call fails with
    /// [`ChunkBuildError::Disposed`].
    pub fn dispose(&mut self) {
        self.images.clear();
        self.textures.clear();
        self.canvas = None;
    }
}

fn wants_water_overlay(tile: &TileDescriptor) -> bool {
    tile.is_water && tile.top.is_some()
}
