use crate::components::body::SceneNode;
use crate::renderer::instance::{BodyInstance, InstanceBuffer};

/// Build the instance buffer from the world's nodes, one instance per node.
pub fn build_instance_buffer<'a>(nodes: impl Iterator<Item = &'a SceneNode>, buffer: &mut InstanceBuffer) {
    buffer.clear();

    for (index, node) in nodes.enumerate() {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        buffer.push(BodyInstance {
            model: node.world_matrix().as_mat4().to_cols_array_2d(),
            body: node.body.index() as f32,
            node: index as f32,
            cast_shadow: flag(node.casts_shadow()),
            receive_shadow: flag(node.receives_shadow()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BodyId, NodeId};
    use crate::assets::glb::ModelAsset;
    use crate::components::mesh::{MeshGeometry, MeshNode};
    use glam::{DVec3, Mat4};

    #[test]
    fn one_instance_per_node_with_translation() {
        let nodes = vec![
            SceneNode::new(NodeId(1), BodyId::Venus, ModelAsset::default())
                .with_position(DVec3::new(-280.0, 0.0, 0.0))
                .with_scale(5.0),
            SceneNode::new(NodeId(2), BodyId::Uranus, ModelAsset::default())
                .with_position(DVec3::new(18_220.0, 0.0, 0.0))
                .with_scale(5.0),
        ];
        let mut buffer = InstanceBuffer::default();
        build_instance_buffer(nodes.iter(), &mut buffer);

        assert_eq!(buffer.instance_count(), 2);
        let venus = &buffer.instances[0];
        assert_eq!(venus.body, BodyId::Venus.index() as f32);
        assert_eq!(venus.model[0][0], 5.0);
        assert_eq!(venus.model[3][0], -280.0);
        assert_eq!(buffer.instances[1].node, 1.0);
    }

    #[test]
    fn shadow_flags_follow_meshes() {
        let mut mesh = MeshNode::new("surface", Mat4::IDENTITY, MeshGeometry::default());
        mesh.normalize();
        let model = ModelAsset { nodes: vec![mesh] };
        let nodes = vec![SceneNode::new(NodeId(1), BodyId::Earth, model)];

        let mut buffer = InstanceBuffer::default();
        build_instance_buffer(nodes.iter(), &mut buffer);
        assert_eq!(buffer.instances[0].cast_shadow, 1.0);
        assert_eq!(buffer.instances[0].receive_shadow, 1.0);
    }
}
