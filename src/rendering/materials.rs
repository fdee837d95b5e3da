use bevy::prelude::*;

/// Matte PBR material sampling a baked chunk atlas.
pub fn chunk_material(atlas: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(atlas),
        perceptual_roughness: 0.9,
        metallic: 0.0,
        reflectance: 0.1,
        ..default()
    }
}
