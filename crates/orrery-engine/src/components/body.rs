use glam::{DMat4, DVec3};

use crate::api::types::{BodyId, NodeId};
use crate::assets::glb::ModelAsset;

/// A loaded body placed in the world.
/// Created once per successful load, never removed.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Unique identifier.
    pub id: NodeId,
    /// Which body this model represents.
    pub body: BodyId,
    /// Path the model was loaded from.
    pub source: String,
    /// Position in world space.
    pub position: DVec3,
    /// Uniform scale.
    pub scale: f64,
    /// Normalized geometry, in model space.
    pub model: ModelAsset,
}

impl SceneNode {
    pub fn new(id: NodeId, body: BodyId, model: ModelAsset) -> Self {
        Self {
            id,
            body,
            source: String::new(),
            position: DVec3::ZERO,
            scale: 1.0,
            model,
        }
    }

    // -- Builder pattern --

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Model-to-world transform: uniform scale, then translation.
    pub fn world_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(
            DVec3::splat(self.scale),
            glam::DQuat::IDENTITY,
            self.position,
        )
    }

    /// Whether any mesh of this node casts shadows.
    pub fn casts_shadow(&self) -> bool {
        self.model.nodes.iter().any(|n| n.cast_shadow)
    }

    pub fn receives_shadow(&self) -> bool {
        self.model.nodes.iter().any(|n| n.receive_shadow)
    }
}
