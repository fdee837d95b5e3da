use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::constants::{TILE_SIZE, WORLD_SCALE};
use crate::rendering::atlas::{tile_uv_rect, UvRect};
use crate::terrain::chunk::{ChunkBuildError, ChunkData};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Face {
    Top,
    /// The +Z wall of an elevated tile. The other three walls are not emitted.
    Front,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Uniformly scales every position.
    pub fn scale(&mut self, factor: f32) {
        for position in &mut self.positions {
            *position = (Vec3::from_array(*position) * factor).to_array();
        }
    }

    /// Replaces the normals with area-weighted averages of the faces sharing each vertex.
    pub fn compute_smooth_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let face_normal = (pb - pa).cross(pc - pa);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Builds the finished chunk mesh at the default world scale.
pub fn build_chunk_geometry(chunk: &ChunkData) -> Result<MeshData, ChunkBuildError> {
    build_chunk_geometry_scaled(chunk, WORLD_SCALE)
}

/// Assembles the tile faces, then scales by `world_scale` and smooths the normals.
pub fn build_chunk_geometry_scaled(chunk: &ChunkData, world_scale: f32) -> Result<MeshData, ChunkBuildError> {
    let mut mesh_data = assemble_chunk_geometry(chunk)?;
    mesh_data.scale(world_scale);
    mesh_data.compute_smooth_normals();
    Ok(mesh_data)
}

/// Unit-scale faces with flat per-face normals, before the finishing pass.
pub fn assemble_chunk_geometry(chunk: &ChunkData) -> Result<MeshData, ChunkBuildError> {
    let tiles = chunk.validate()?;
    let mut mesh_data = MeshData::new();

    for (x, z, tile) in chunk.tiles() {
        let uv = tile_uv_rect(x, z, tiles);
        add_face(&mut mesh_data, x, z, tile.height, Face::Top, uv);
        if tile.has_side() {
            add_face(&mut mesh_data, x, z, tile.height, Face::Front, uv);
        }
    }

    Ok(mesh_data)
}

fn add_face(mesh_data: &mut MeshData, x: usize, z: usize, height: f32, face: Face, uv: UvRect) {
    let x = x as f32 * TILE_SIZE;
    let z = z as f32 * TILE_SIZE;
    let s = TILE_SIZE;
    let h = height;
    let (u0, v0, u1, v1) = (uv.min.x, uv.min.y, uv.max.x, uv.max.y);

    // Counter-clockwise when viewed from outside the face
    let (corners, normal, face_uvs) = match face {
        Face::Top => (
            [[x, h, z], [x, h, z + s], [x + s, h, z + s], [x + s, h, z]],
            [0.0, 1.0, 0.0],
            [[u0, v0], [u0, v1], [u1, v1], [u1, v0]],
        ),
        Face::Front => (
            [[x, 0.0, z + s], [x + s, 0.0, z + s], [x + s, h, z + s], [x, h, z + s]],
            [0.0, 0.0, 1.0],
            [[u0, v1], [u1, v1], [u1, v0], [u0, v0]],
        ),
    };

    let start_idx = mesh_data.positions.len() as u32;

    mesh_data.positions.extend(corners);
    mesh_data.normals.extend([normal; 4]);
    mesh_data.uvs.extend(face_uvs);

    mesh_data.indices.extend([
        start_idx,
        start_idx + 1,
        start_idx + 2,
        start_idx,
        start_idx + 2,
        start_idx + 3,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::types::{DefaultTextureSet, TileDescriptor};

    fn chunk_with(size: usize, tiles: &[(usize, usize, TileDescriptor)]) -> ChunkData {
        let mut chunk = ChunkData::empty(0, 0, size, DefaultTextureSet::new("dirt"));
        for (x, z, tile) in tiles {
            chunk.set_tile(*x, *z, Some(tile.clone()));
        }
        chunk
    }

    fn raised(height: f32) -> TileDescriptor {
        TileDescriptor {
            height,
            ..default()
        }
    }

    #[test]
    fn empty_chunk_has_empty_buffers() {
        let mesh = build_chunk_geometry(&chunk_with(4, &[])).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.positions.is_empty());
        assert!(mesh.normals.is_empty());
        assert!(mesh.uvs.is_empty());
    }

    #[test]
    fn flat_tile_is_one_quad() {
        let mesh = build_chunk_geometry(&chunk_with(2, &[(0, 0, raised(0.0))])).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn elevated_tile_adds_front_wall() {
        let flat = build_chunk_geometry(&chunk_with(2, &[(1, 0, raised(0.0))])).unwrap();
        let tall = build_chunk_geometry(&chunk_with(2, &[(1, 0, raised(1.5))])).unwrap();
        assert_eq!(tall.vertex_count(), flat.vertex_count() + 4);
        assert_eq!(tall.indices.len(), flat.indices.len() + 6);
        assert_eq!(&tall.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn negative_height_has_no_wall() {
        let mesh = build_chunk_geometry(&chunk_with(2, &[(0, 0, raised(-1.0))])).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn assembled_faces_use_unit_footprint_and_flat_normals() {
        let mesh = assemble_chunk_geometry(&chunk_with(4, &[(2, 1, raised(0.5))])).unwrap();
        assert_eq!(
            &mesh.positions[..4],
            &[[2.0, 0.5, 1.0], [2.0, 0.5, 2.0], [3.0, 0.5, 2.0], [3.0, 0.5, 1.0]]
        );
        assert!(mesh.normals[..4].iter().all(|n| *n == [0.0, 1.0, 0.0]));
        assert_eq!(
            &mesh.positions[4..],
            &[[2.0, 0.0, 2.0], [3.0, 0.0, 2.0], [3.0, 0.5, 2.0], [2.0, 0.5, 2.0]]
        );
        assert!(mesh.normals[4..].iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn finishing_pass_scales_and_keeps_face_orientation() {
        let mesh = build_chunk_geometry(&chunk_with(4, &[(2, 1, raised(0.5))])).unwrap();
        assert_eq!(mesh.positions[0], [4.0, 1.0, 2.0]);
        assert_eq!(mesh.positions[2], [6.0, 1.0, 4.0]);
        // Winding is counter-clockwise, so smoothed normals point out of each face
        for normal in &mesh.normals[..4] {
            assert!((Vec3::from_array(*normal) - Vec3::Y).length() < 1e-6);
        }
        for normal in &mesh.normals[4..] {
            assert!((Vec3::from_array(*normal) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn uvs_address_the_tile_cell() {
        let mesh = build_chunk_geometry(&chunk_with(4, &[(1, 3, raised(2.0))])).unwrap();
        for uv in &mesh.uvs {
            assert!(uv[0] == 0.25 || uv[0] == 0.5);
            assert!(uv[1] == 0.75 || uv[1] == 1.0);
        }
        assert_eq!(mesh.uvs[0], [0.25, 0.75]);
        assert_eq!(mesh.uvs[2], [0.5, 1.0]);
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let mut chunk = chunk_with(2, &[]);
        chunk.data[0].push(None);
        assert!(matches!(
            build_chunk_geometry(&chunk),
            Err(ChunkBuildError::NotSquare { .. })
        ));
    }

    #[test]
    fn converts_into_bevy_mesh() {
        let mesh = build_chunk_geometry(&chunk_with(2, &[(0, 0, raised(1.0))]))
            .unwrap()
            .into_mesh();
        assert_eq!(mesh.count_vertices(), 8);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(12));
    }
}
