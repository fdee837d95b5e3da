use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::config::loader::{load_config, parse_config, ConfigError};
use crate::rendering::images::ImageLoadError;
use crate::terrain::types::{DefaultTextureSet, TileDescriptor};

#[derive(Error, Debug)]
pub enum ChunkBuildError {
    #[error("compositor used after dispose")]
    Disposed,
    #[error("chunk grid is not square: row {row} has {found} tiles, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("chunk grid has {tiles} tiles per side but the atlas holds {capacity}")]
    SizeMismatch { tiles: usize, capacity: usize },
    #[error("texture error: {0}")]
    Texture(#[from] ImageLoadError),
}

/// One chunk as handed over by the world data provider.
///
/// `data` is indexed `data[x][z]`; `None` cells hold no tile.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkData {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub r_order: Option<i32>,
    pub data: Vec<Vec<Option<TileDescriptor>>>,
    pub def_texture: DefaultTextureSet,
}

impl ChunkData {
    /// An all-empty square chunk.
    pub fn empty(x: i32, y: i32, size: usize, def_texture: DefaultTextureSet) -> Self {
        Self {
            x,
            y,
            r_order: None,
            data: vec![vec![None; size]; size],
            def_texture,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        parse_config(source)
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey::from_chunk(self)
    }

    /// Tiles per side of the grid.
    pub fn chunk_size(&self) -> usize {
        self.data.len()
    }

    /// Checks the grid is square and returns its side length.
    pub fn validate(&self) -> Result<usize, ChunkBuildError> {
        let expected = self.data.len();
        for (row, column) in self.data.iter().enumerate() {
            if column.len() != expected {
                return Err(ChunkBuildError::NotSquare {
                    row,
                    expected,
                    found: column.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn tile(&self, x: usize, z: usize) -> Option<&TileDescriptor> {
        self.data.get(x)?.get(z)?.as_ref()
    }

    pub fn set_tile(&mut self, x: usize, z: usize, tile: Option<TileDescriptor>) {
        if let Some(cell) = self.data.get_mut(x).and_then(|column| column.get_mut(z)) {
            *cell = tile;
        }
    }

    /// Present tiles in row-major order (`x` outer, `z` inner).
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, &TileDescriptor)> + '_ {
        self.data.iter().enumerate().flat_map(|(x, column)| {
            column
                .iter()
                .enumerate()
                .filter_map(move |(z, cell)| cell.as_ref().map(|tile| (x, z, tile)))
        })
    }
}

/// Positional identity of a chunk texture; ignores tile contents.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
    pub r_order: i32,
}

impl ChunkKey {
    pub fn new(x: i32, y: i32, r_order: Option<i32>) -> Self {
        Self {
            x,
            y,
            r_order: r_order.unwrap_or(0),
        }
    }

    pub fn from_chunk(chunk: &ChunkData) -> Self {
        Self::new(chunk.x, chunk.y, chunk.r_order)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.x, self.y, self.r_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Option<TileDescriptor> {
        Some(TileDescriptor::default())
    }

    #[test]
    fn key_format_defaults_r_order_to_zero() {
        assert_eq!(ChunkKey::new(3, -2, None).to_string(), "3_-2_0");
        assert_eq!(ChunkKey::new(3, -2, Some(5)).to_string(), "3_-2_5");
        assert_ne!(ChunkKey::new(0, 0, Some(1)), ChunkKey::new(0, 0, None));
    }

    #[test]
    fn tiles_walk_x_outer_z_inner_and_skip_empty() {
        let mut chunk = ChunkData::empty(0, 0, 2, DefaultTextureSet::new("dirt"));
        chunk.set_tile(0, 1, tile());
        chunk.set_tile(1, 0, tile());
        chunk.set_tile(1, 1, tile());

        let order: Vec<(usize, usize)> = chunk.tiles().map(|(x, z, _)| (x, z)).collect();
        assert_eq!(order, vec![(0, 1), (1, 0), (1, 1)]);
        assert!(chunk.tile(0, 0).is_none());
        assert!(chunk.tile(5, 5).is_none());
    }

    #[test]
    fn validate_rejects_ragged_grid() {
        let mut chunk = ChunkData::empty(0, 0, 3, DefaultTextureSet::new("dirt"));
        assert_eq!(chunk.validate().unwrap(), 3);

        chunk.data[1].pop();
        assert!(matches!(
            chunk.validate(),
            Err(ChunkBuildError::NotSquare { row: 1, expected: 3, found: 2 })
        ));
    }

    #[test]
    fn chunk_parses_from_yaml() {
        let yaml = r#"
x: 4
y: 7
rOrder: 2
defTexture: { middle: dirt, noise: true }
data:
  - [ { top: grass, height: 1 }, null ]
  - [ null, { middle: sand } ]
"#;
        let chunk = ChunkData::from_yaml(yaml).unwrap();
        assert_eq!(chunk.key().to_string(), "4_7_2");
        assert_eq!(chunk.chunk_size(), 2);
        assert!(chunk.def_texture.noise);
        assert_eq!(chunk.tile(0, 0).and_then(|t| t.top.as_deref()), Some("grass"));
        assert_eq!(chunk.tile(1, 1).and_then(|t| t.middle.as_deref()), Some("sand"));
        assert_eq!(chunk.tiles().count(), 2);
    }
}
