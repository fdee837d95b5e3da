use bevy::color::{ColorToPacked, HexColorError, Srgba};
use image::Rgba;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_NOISE_INTENSITY, DEFAULT_ROAD_COLOR, DEFAULT_ROAD_WIDTH, DEFAULT_SPECKLE_COLOR,
    DEFAULT_SPECKLE_SIZE,
};

/// An 8-bit RGBA color, written as a hex string (`#rgb`, `#rrggbb`, `#rrggbbaa`) in data files.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct TileColor([u8; 4]);

impl TileColor {
    pub const fn from_array(rgba: [u8; 4]) -> Self {
        Self(rgba)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn from_hex(hex: &str) -> Result<Self, HexColorError> {
        Ok(Self(Srgba::hex(hex)?.to_u8_array()))
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.0)
    }
}

impl TryFrom<String> for TileColor {
    type Error = HexColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

/// A decorative dot placed relative to the tile (0..1 on both axes).
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Speckle {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub size: Option<f32>,
    #[serde(default)]
    pub color: Option<TileColor>,
}

impl Speckle {
    pub fn size(&self) -> f32 {
        self.size.unwrap_or(DEFAULT_SPECKLE_SIZE)
    }

    pub fn color(&self) -> TileColor {
        self.color.unwrap_or(TileColor::from_array(DEFAULT_SPECKLE_COLOR))
    }
}

#[derive(Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum RoadDirection {
    Horizontal,
    Vertical,
    /// Any other direction in the source data; never drawn.
    #[serde(other)]
    Unsupported,
}

/// A straight stroke crossing the whole tile through its midline.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Road {
    pub direction: RoadDirection,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub color: Option<TileColor>,
}

impl Road {
    pub fn width(&self) -> f32 {
        self.width.unwrap_or(DEFAULT_ROAD_WIDTH)
    }

    pub fn color(&self) -> TileColor {
        self.color.unwrap_or(TileColor::from_array(DEFAULT_ROAD_COLOR))
    }
}

/// Everything needed to draw and mesh one grid cell.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TileDescriptor {
    pub top: Option<String>,
    pub middle: Option<String>,
    /// Elevation of the top face.
    pub height: f32,
    pub is_water: bool,
    /// Strength of the radial highlight, expected in 0..=1.
    pub lighting: Option<f32>,
    pub speckles: Vec<Speckle>,
    pub roads: Vec<Road>,
}

impl TileDescriptor {
    /// Texture used for the base layer: `top`, then `middle`, then the chunk default.
    pub fn base_texture<'a>(&'a self, defaults: &'a DefaultTextureSet) -> &'a str {
        self.top
            .as_deref()
            .or(self.middle.as_deref())
            .unwrap_or(&defaults.middle)
    }

    pub fn has_side(&self) -> bool {
        self.height > 0.0
    }
}

/// Chunk-wide fallback textures and noise settings.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTextureSet {
    pub middle: String,
    #[serde(default)]
    pub noise: bool,
    #[serde(default)]
    pub noise_size: Option<f32>,
}

impl DefaultTextureSet {
    pub fn new(middle: impl Into<String>) -> Self {
        Self {
            middle: middle.into(),
            noise: false,
            noise_size: None,
        }
    }

    /// Noise intensity, or `None` when the noise layer is off.
    ///
    /// A missing or non-finite `noise_size` uses the default intensity.
    pub fn noise_intensity(&self) -> Option<f32> {
        self.noise.then(|| {
            self.noise_size
                .filter(|size| size.is_finite())
                .unwrap_or(DEFAULT_NOISE_INTENSITY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_texture_prefers_top_then_middle() {
        let defaults = DefaultTextureSet::new("dirt");
        let mut tile = TileDescriptor::default();
        assert_eq!(tile.base_texture(&defaults), "dirt");

        tile.middle = Some("stone".into());
        assert_eq!(tile.base_texture(&defaults), "stone");

        tile.top = Some("grass".into());
        assert_eq!(tile.base_texture(&defaults), "grass");
    }

    #[test]
    fn tile_deserializes_camel_case_fields() {
        let yaml = r##"
top: grass
isWater: true
height: 1.5
lighting: 0.5
speckles:
  - { x: 0.25, y: 0.75 }
  - { x: 0.5, y: 0.5, size: 3, color: "#ff0000" }
roads:
  - { direction: horizontal }
  - { direction: diagonal, width: 4 }
"##;
        let tile: TileDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tile.top.as_deref(), Some("grass"));
        assert!(tile.is_water);
        assert_eq!(tile.height, 1.5);
        assert_eq!(tile.lighting, Some(0.5));

        assert_eq!(tile.speckles[0].size(), DEFAULT_SPECKLE_SIZE);
        assert_eq!(tile.speckles[0].color(), TileColor::rgb(255, 255, 255));
        assert_eq!(tile.speckles[1].size(), 3.0);
        assert_eq!(tile.speckles[1].color(), TileColor::rgb(255, 0, 0));

        assert_eq!(tile.roads[0].direction, RoadDirection::Horizontal);
        assert_eq!(tile.roads[0].width(), DEFAULT_ROAD_WIDTH);
        assert_eq!(tile.roads[0].color(), TileColor::rgb(128, 128, 128));
        assert_eq!(tile.roads[1].direction, RoadDirection::Unsupported);
    }

    #[test]
    fn noise_intensity_defaults_when_enabled() {
        let mut defaults = DefaultTextureSet::new("dirt");
        assert_eq!(defaults.noise_intensity(), None);

        defaults.noise = true;
        assert_eq!(defaults.noise_intensity(), Some(DEFAULT_NOISE_INTENSITY));

        defaults.noise_size = Some(24.0);
        assert_eq!(defaults.noise_intensity(), Some(24.0));

        defaults.noise_size = Some(f32::INFINITY);
        assert_eq!(defaults.noise_intensity(), Some(DEFAULT_NOISE_INTENSITY));
        defaults.noise_size = Some(f32::NAN);
        assert_eq!(defaults.noise_intensity(), Some(DEFAULT_NOISE_INTENSITY));
    }
}
