pub mod constants;
pub mod config;
pub mod terrain;
pub mod rendering;

pub use config::baker::BakerConfig;
pub use rendering::compositor::{ChunkTexture, ChunkTextureCompositor};
pub use rendering::images::{FileImageSource, ImageLoadError, ImageSource, MemoryImageSource};
pub use terrain::chunk::{ChunkBuildError, ChunkData, ChunkKey};
pub use terrain::meshing::{build_chunk_geometry, MeshData};
pub use terrain::plugin::{generate_chunk_mesh, ChunkBakerPlugin, PendingChunks, RenderableChunk};
pub use terrain::types::{DefaultTextureSet, Road, RoadDirection, Speckle, TileColor, TileDescriptor};
