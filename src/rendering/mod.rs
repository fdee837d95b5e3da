pub mod atlas;
pub mod canvas;
pub mod compositor;
pub mod images;
pub mod layers;
pub mod materials;
