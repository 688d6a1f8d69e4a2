pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod bridge;
pub mod input;
pub mod assets;

// Re-export key types at crate root for convenience
pub use api::config::{ControlsConfig, DirectionalConfig, LightConfig, SceneConfig};
pub use api::error::{GlbError, SceneError};
pub use api::types::{BodyId, NodeId, AU};
pub use api::viewport::{Display, Surface, Viewport};
pub use assets::glb::{parse_glb, ModelAsset};
pub use assets::loader::{AssetLoader, LoadEvent, LoadRequest, LoadTicket};
pub use assets::manifest::{AssetManifest, ModelDescriptor};
pub use assets::registry::{BodyRegistry, FocusConfig};
pub use bridge::protocol::{FrameBuffer, FrameLayout, LIGHT_FLOATS, MAX_LIGHTS};
pub use components::body::SceneNode;
pub use components::mesh::{Aabb, BoundingSphere, MeshGeometry, MeshMaterial, MeshNode, TextureImage};
pub use crate::core::world::World;
pub use input::queue::{InputEvent, InputQueue, PointerButton};
pub use renderer::camera::{CameraUniform, PerspectiveCamera};
pub use renderer::controls::{OrbitControls, Spherical};
pub use renderer::instance::{BodyInstance, InstanceBuffer};
pub use renderer::rig::{CameraRig, CameraState};
pub use renderer::traits::{FrameData, Renderer};
pub use systems::lighting::{AmbientLight, DirectionalLight, LightRecord, LightRig};
