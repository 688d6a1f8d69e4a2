pub mod glb;
pub mod loader;
pub mod manifest;
pub mod registry;
