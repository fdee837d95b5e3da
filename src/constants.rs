// Chunk dimensions
pub const CHUNK_TILES: u32 = 16;

// Atlas defaults (overridden by config)
pub const DEFAULT_TILE_RESOLUTION: u32 = 64;
pub const DEFAULT_TEXTURE_ROOT: &str = "assets/textures";

// Meshing
pub const TILE_SIZE: f32 = 1.0;
pub const WORLD_SCALE: f32 = 2.0;

// Compositing layers
pub const WATER_OPACITY: f32 = 0.7;
pub const LIGHTING_STRENGTH: f32 = 0.3;
pub const DEFAULT_NOISE_INTENSITY: f32 = 10.0;
pub const DEFAULT_SPECKLE_SIZE: f32 = 1.0;
pub const DEFAULT_ROAD_WIDTH: f32 = 2.0;

// Colors (RGBA8, fallback/light overridden by config)
pub const DEFAULT_FALLBACK_COLOR: [u8; 4] = [139, 115, 85, 255];
pub const DEFAULT_WATER_FALLBACK_COLOR: [u8; 4] = [63, 127, 191, 255];
pub const DEFAULT_LIGHT_COLOR: [u8; 4] = [255, 244, 214, 255];
pub const DEFAULT_SPECKLE_COLOR: [u8; 4] = [255, 255, 255, 255];
pub const DEFAULT_ROAD_COLOR: [u8; 4] = [128, 128, 128, 255];
