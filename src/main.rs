use std::path::PathBuf;
use std::process::ExitCode;

use chunk_baker::terrain::plugin::generate_chunk_mesh_scaled;
use chunk_baker::{BakerConfig, ChunkData, ChunkTextureCompositor, FileImageSource};
use image::RgbaImage;
use log::{error, info};

const CONFIG_PATH: &str = "config/baker.yaml";
const DEFAULT_CHUNK_PATH: &str = "assets/chunks/demo.yaml";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let chunk_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHUNK_PATH));

    let config = match BakerConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load {CONFIG_PATH}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let chunk = match ChunkData::load(&chunk_path) {
        Ok(chunk) => chunk,
        Err(err) => {
            error!("Failed to load chunk {}: {err}", chunk_path.display());
            return ExitCode::FAILURE;
        }
    };

    let source = FileImageSource::new(&config.texture_root);
    let mut compositor = ChunkTextureCompositor::from_config(&config, source);

    let Some(renderable) =
        pollster::block_on(generate_chunk_mesh_scaled(&mut compositor, &chunk, config.world_scale))
    else {
        return ExitCode::FAILURE;
    };

    info!(
        "Chunk {}: {} vertices, {} triangles, placed at {}",
        renderable.key,
        renderable.mesh.vertex_count(),
        renderable.mesh.triangle_count(),
        renderable.translation
    );

    let size = renderable.texture.size();
    let pixels = renderable.texture.data.clone().unwrap_or_default();
    let Some(atlas) = RgbaImage::from_raw(size.x, size.y, pixels) else {
        error!("Atlas buffer does not match its {}x{} size", size.x, size.y);
        return ExitCode::FAILURE;
    };

    let out_path = format!("{}_atlas.png", renderable.key);
    if let Err(err) = atlas.save(&out_path) {
        error!("Failed to write {out_path}: {err}");
        return ExitCode::FAILURE;
    }
    info!("Atlas written to {out_path}");

    compositor.dispose();
    ExitCode::SUCCESS
}
