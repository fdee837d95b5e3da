use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::loader::{load_config, ConfigError};
use crate::constants::{
    CHUNK_TILES, DEFAULT_FALLBACK_COLOR, DEFAULT_LIGHT_COLOR, DEFAULT_TEXTURE_ROOT,
    DEFAULT_TILE_RESOLUTION, DEFAULT_WATER_FALLBACK_COLOR, WORLD_SCALE,
};
use crate::terrain::types::TileColor;

/// Settings shared by the compositor and the mesh builder.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BakerConfig {
    /// Tiles along each side of a chunk; also the atlas grid size.
    pub tiles_per_side: u32,
    /// Pixel edge length of one tile cell in the atlas.
    pub tile_resolution: u32,
    /// World units per tile after the finishing pass.
    pub world_scale: f32,
    /// Flat fill used when a base texture cannot be resolved.
    pub fallback_color: TileColor,
    /// Flat tint used when a water overlay texture cannot be resolved.
    pub water_fallback_color: TileColor,
    /// Color of the radial lighting highlight.
    pub light_color: TileColor,
    /// Mixed with the chunk key to seed the noise layer.
    pub noise_seed: u64,
    /// Directory searched by [`crate::FileImageSource`].
    pub texture_root: PathBuf,
}

impl Default for BakerConfig {
    fn default() -> Self {
        Self {
            tiles_per_side: CHUNK_TILES,
            tile_resolution: DEFAULT_TILE_RESOLUTION,
            world_scale: WORLD_SCALE,
            fallback_color: TileColor::from_array(DEFAULT_FALLBACK_COLOR),
            water_fallback_color: TileColor::from_array(DEFAULT_WATER_FALLBACK_COLOR),
            light_color: TileColor::from_array(DEFAULT_LIGHT_COLOR),
            noise_seed: 0,
            texture_root: PathBuf::from(DEFAULT_TEXTURE_ROOT),
        }
    }
}

impl BakerConfig {
    /// Loads and validates a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles_per_side == 0 {
            return Err(ConfigError::Invalid("tiles_per_side must be > 0".into()));
        }
        if self.tile_resolution == 0 {
            return Err(ConfigError::Invalid("tile_resolution must be > 0".into()));
        }
        if self.tiles_per_side.checked_mul(self.tile_resolution).is_none() {
            return Err(ConfigError::Invalid(format!(
                "atlas of {} tiles at {} px overflows u32",
                self.tiles_per_side, self.tile_resolution
            )));
        }
        if !(self.world_scale > 0.0) {
            return Err(ConfigError::Invalid("world_scale must be > 0".into()));
        }
        Ok(())
    }

    /// Edge length of the whole atlas in pixels.
    pub fn atlas_size(&self) -> u32 {
        self.tiles_per_side * self.tile_resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: BakerConfig = parse_config("tile_resolution: 32\n").unwrap();
        assert_eq!(config.tile_resolution, 32);
        assert_eq!(config.tiles_per_side, CHUNK_TILES);
        assert_eq!(config.world_scale, WORLD_SCALE);
        assert_eq!(config.fallback_color.to_rgba(), image::Rgba([139, 115, 85, 255]));
        assert_eq!(config.atlas_size(), CHUNK_TILES * 32);
    }

    #[test]
    fn colors_parse_from_hex() {
        let config: BakerConfig = parse_config("fallback_color: \"#ff000080\"\n").unwrap();
        assert_eq!(config.fallback_color.to_rgba(), image::Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn bad_color_is_a_yaml_error() {
        let result: Result<BakerConfig, _> = parse_config("light_color: not-a-color\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn validate_rejects_degenerate_sizes() {
        let mut config = BakerConfig::default();
        config.tile_resolution = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = BakerConfig::default();
        config.world_scale = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = BakerConfig::default();
        config.tiles_per_side = 1 << 16;
        config.tile_resolution = 1 << 16;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        assert!(BakerConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = BakerConfig::load("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
