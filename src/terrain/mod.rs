pub mod chunk;
pub mod meshing;
pub mod plugin;
pub mod types;
