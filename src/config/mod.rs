pub mod baker;
pub mod loader;
