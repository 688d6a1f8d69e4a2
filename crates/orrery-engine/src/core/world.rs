use crate::api::config::SceneConfig;
use crate::api::types::{BodyId, NodeId};
use crate::components::body::SceneNode;
use crate::systems::lighting::LightRig;

/// The renderable scene graph: loaded bodies, lights, background.
/// Append-only: bodies are inserted whole and never removed.
pub struct World {
    nodes: Vec<SceneNode>,
    lights: LightRig,
    background: [f32; 3],
    next_id: u32,
    /// Bumped on every insertion so renderers know to upload new geometry.
    generation: u32,
}

impl World {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(BodyId::COUNT),
            lights: LightRig::from_config(config),
            background: config.background_rgb(),
            next_id: 1,
            generation: 0,
        }
    }

    /// Generate the next unique node ID.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a fully prepared node to the world.
    pub fn insert(&mut self, node: SceneNode) {
        self.nodes.push(node);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Find the first node loaded for a body.
    pub fn find_body(&self, body: BodyId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.body == body)
    }

    /// Iterate over all nodes, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    /// Node at an insertion-order index.
    pub fn node_at(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}
