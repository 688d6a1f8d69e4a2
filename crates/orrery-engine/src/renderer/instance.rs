use bytemuck::{Pod, Zeroable};

/// Per-node render data written to the frame buffer for the host renderer.
/// Must match the host protocol: 20 floats = 80 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct BodyInstance {
    /// Model-to-world matrix, column-major.
    pub model: [[f32; 4]; 4],
    /// `BodyId::index()` of the body.
    pub body: f32,
    /// Insertion index of the node in the world (selects uploaded geometry).
    pub node: f32,
    /// 1.0 when the node casts shadows.
    pub cast_shadow: f32,
    /// 1.0 when the node receives shadows.
    pub receive_shadow: f32,
}

impl BodyInstance {
    pub const FLOATS: usize = 20;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Instances drawn this frame, in world insertion order.
pub struct InstanceBuffer {
    pub instances: Vec<BodyInstance>,
}

impl InstanceBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: BodyInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for InstanceBuffer {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_instance_is_20_floats() {
        assert_eq!(std::mem::size_of::<BodyInstance>(), BodyInstance::STRIDE_BYTES);
    }

    #[test]
    fn buffer_push_and_flatten() {
        let mut buf = InstanceBuffer::default();
        buf.push(BodyInstance { body: 3.0, ..Default::default() });
        buf.push(BodyInstance::default());
        assert_eq!(buf.instance_count(), 2);
        assert_eq!(buf.as_floats().len(), 2 * BodyInstance::FLOATS);
        assert_eq!(buf.as_floats()[16], 3.0);
    }
}
