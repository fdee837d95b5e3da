use bevy::prelude::*;
use log::error;

use crate::constants::WORLD_SCALE;
use crate::rendering::compositor::{ChunkTexture, ChunkTextureCompositor};
use crate::rendering::images::ImageSource;
use crate::rendering::materials::chunk_material;
use crate::terrain::chunk::{ChunkBuildError, ChunkData, ChunkKey};
use crate::terrain::meshing::{build_chunk_geometry_scaled, MeshData};

/// Spawns baked chunks handed over through [`PendingChunks`].
pub struct ChunkBakerPlugin;

impl Plugin for ChunkBakerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingChunks>()
            .add_systems(Update, spawn_pending_chunks_system);
    }
}

#[derive(Component)]
pub struct ChunkMesh {
    pub key: ChunkKey,
}

/// Baked chunks waiting to be placed in the scene.
#[derive(Resource, Default)]
pub struct PendingChunks(pub Vec<RenderableChunk>);

/// Geometry and atlas of one chunk plus its world placement.
pub struct RenderableChunk {
    pub key: ChunkKey,
    pub mesh: MeshData,
    pub texture: ChunkTexture,
    pub translation: Vec3,
}

impl RenderableChunk {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation)
    }

    /// Registers the mesh, atlas and material and returns the components to spawn.
    pub fn into_bundle(
        self,
        meshes: &mut Assets<Mesh>,
        images: &mut Assets<Image>,
        materials: &mut Assets<StandardMaterial>,
    ) -> (Mesh3d, MeshMaterial3d<StandardMaterial>, Transform, ChunkMesh) {
        let transform = self.transform();
        let atlas = images.add((*self.texture).clone());
        (
            Mesh3d(meshes.add(self.mesh.into_mesh())),
            MeshMaterial3d(materials.add(chunk_material(atlas))),
            transform,
            ChunkMesh { key: self.key },
        )
    }
}

/// World-space origin of a chunk: `(x * size * scale, 0, y * size * scale)`.
pub fn chunk_translation(chunk: &ChunkData, world_scale: f32) -> Vec3 {
    let span = chunk.chunk_size() as f32 * world_scale;
    Vec3::new(chunk.x as f32 * span, 0.0, chunk.y as f32 * span)
}

/// Builds geometry and atlas for `chunk` at the default world scale.
///
/// Failures are logged and reported as `None` so the caller can skip the chunk.
pub async fn generate_chunk_mesh<S: ImageSource>(
    compositor: &mut ChunkTextureCompositor<S>,
    chunk: &ChunkData,
) -> Option<RenderableChunk> {
    generate_chunk_mesh_scaled(compositor, chunk, WORLD_SCALE).await
}

pub async fn generate_chunk_mesh_scaled<S: ImageSource>(
    compositor: &mut ChunkTextureCompositor<S>,
    chunk: &ChunkData,
    world_scale: f32,
) -> Option<RenderableChunk> {
    match try_generate_chunk_mesh(compositor, chunk, world_scale).await {
        Ok(renderable) => Some(renderable),
        Err(err) => {
            error!("Skipping chunk {}: {err}", chunk.key());
            None
        }
    }
}

async fn try_generate_chunk_mesh<S: ImageSource>(
    compositor: &mut ChunkTextureCompositor<S>,
    chunk: &ChunkData,
    world_scale: f32,
) -> Result<RenderableChunk, ChunkBuildError> {
    let mesh = build_chunk_geometry_scaled(chunk, world_scale)?;
    let texture = compositor.generate_chunk_texture(chunk).await?;

    Ok(RenderableChunk {
        key: chunk.key(),
        mesh,
        texture,
        translation: chunk_translation(chunk, world_scale),
    })
}

fn spawn_pending_chunks_system(
    mut commands: Commands,
    mut pending: ResMut<PendingChunks>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for chunk in pending.0.drain(..) {
        if chunk.mesh.is_empty() {
            continue;
        }
        commands.spawn(chunk.into_bundle(&mut meshes, &mut images, &mut materials));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::types::DefaultTextureSet;

    #[test]
    fn translation_spans_scaled_chunks() {
        let chunk = ChunkData::empty(3, -2, 16, DefaultTextureSet::new("dirt"));
        assert_eq!(chunk_translation(&chunk, 2.0), Vec3::new(96.0, 0.0, -64.0));
    }
}
