//! Frame buffer the JS renderer reads after every frame.
//!
//! ```text
//! [Header: 16 floats]
//! [Camera: 36 floats (view, projection, eye)]
//! [Lights: MAX_LIGHTS x 8 floats]
//! [Instances: max_instances x 20 floats]
//! ```
//!
//! All values are f32. Instance capacity is written into the header each
//! frame so the reader can derive offsets without a side channel.

use crate::renderer::camera::CameraUniform;
use crate::renderer::instance::BodyInstance;
use crate::renderer::traits::FrameData;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 16;

/// Header field indices.
pub const HEADER_FRAME_COUNTER: usize = 0;
pub const HEADER_PROTOCOL_VERSION: usize = 1;
pub const HEADER_VIEWPORT_WIDTH: usize = 2;
pub const HEADER_VIEWPORT_HEIGHT: usize = 3;
pub const HEADER_BACKGROUND_R: usize = 4;
pub const HEADER_BACKGROUND_G: usize = 5;
pub const HEADER_BACKGROUND_B: usize = 6;
pub const HEADER_LIGHT_COUNT: usize = 7;
pub const HEADER_MAX_INSTANCES: usize = 8;
pub const HEADER_INSTANCE_COUNT: usize = 9;
pub const HEADER_WORLD_GENERATION: usize = 10;
pub const HEADER_SCENE_VISIBLE: usize = 11;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per light record (wire format, fixed).
pub const LIGHT_FLOATS: usize = 8;

/// One ambient plus one directional light.
pub const MAX_LIGHTS: usize = 2;

/// Default instance capacity: one per registry body with headroom.
pub const DEFAULT_MAX_INSTANCES: usize = 32;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub max_instances: usize,

    pub camera_offset: usize,
    pub light_offset: usize,
    pub instance_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl FrameLayout {
    pub fn new(max_instances: usize) -> Self {
        let camera_offset = HEADER_FLOATS;
        let light_offset = camera_offset + CameraUniform::FLOATS;
        let instance_offset = light_offset + MAX_LIGHTS * LIGHT_FLOATS;
        let buffer_total_floats = instance_offset + max_instances * BodyInstance::FLOATS;

        Self {
            max_instances,
            camera_offset,
            light_offset,
            instance_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INSTANCES)
    }
}

/// Flat f32 buffer the host renderer reads after each frame.
pub struct FrameBuffer {
    layout: FrameLayout,
    data: Vec<f32>,
    frame_counter: u32,
}

impl FrameBuffer {
    pub fn new(layout: FrameLayout) -> Self {
        let data = vec![0.0; layout.buffer_total_floats];
        Self {
            layout,
            data,
            frame_counter: 0,
        }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Serialize one frame. Instances beyond capacity are dropped with a warning.
    pub fn write(&mut self, frame: &FrameData) {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        let layout = &self.layout;

        let instance_count = frame.instances.len().min(layout.max_instances);
        if instance_count < frame.instances.len() {
            log::warn!(
                "frame has {} instances, buffer holds {}",
                frame.instances.len(),
                layout.max_instances
            );
        }

        let header = &mut self.data[..HEADER_FLOATS];
        header[HEADER_FRAME_COUNTER] = self.frame_counter as f32;
        header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        header[HEADER_VIEWPORT_WIDTH] = frame.viewport.0 as f32;
        header[HEADER_VIEWPORT_HEIGHT] = frame.viewport.1 as f32;
        header[HEADER_BACKGROUND_R] = frame.background[0];
        header[HEADER_BACKGROUND_G] = frame.background[1];
        header[HEADER_BACKGROUND_B] = frame.background[2];
        header[HEADER_LIGHT_COUNT] = frame.lights.len().min(MAX_LIGHTS) as f32;
        header[HEADER_MAX_INSTANCES] = layout.max_instances as f32;
        header[HEADER_INSTANCE_COUNT] = instance_count as f32;
        header[HEADER_WORLD_GENERATION] = frame.world_generation as f32;
        header[HEADER_SCENE_VISIBLE] = if frame.visible { 1.0 } else { 0.0 };

        let camera: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&frame.camera));
        self.data[layout.camera_offset..layout.light_offset].copy_from_slice(camera);

        let lights: &[f32] = bytemuck::cast_slice(&frame.lights[..frame.lights.len().min(MAX_LIGHTS)]);
        self.data[layout.light_offset..layout.light_offset + lights.len()].copy_from_slice(lights);

        let instances: &[f32] = bytemuck::cast_slice(&frame.instances[..instance_count]);
        self.data[layout.instance_offset..layout.instance_offset + instances.len()].copy_from_slice(instances);
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw pointer for host reads out of WASM memory.
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::camera::PerspectiveCamera;
    use crate::systems::lighting::LightRig;

    #[test]
    fn offsets_are_contiguous() {
        let layout = FrameLayout::new(10);
        assert_eq!(layout.camera_offset, HEADER_FLOATS);
        assert_eq!(layout.light_offset, HEADER_FLOATS + 36);
        assert_eq!(layout.instance_offset, HEADER_FLOATS + 36 + 16);
        assert_eq!(layout.buffer_total_floats, HEADER_FLOATS + 36 + 16 + 10 * 20);
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn write_fills_header_and_sections() {
        let cam = PerspectiveCamera::new(75.0, 1.5, 0.1, 1000.0);
        let lights = LightRig::default().records();
        let instances = [BodyInstance { body: 7.0, ..Default::default() }];
        let frame = FrameData {
            camera: cam.uniform(),
            lights: &lights,
            instances: &instances,
            background: [0.1, 0.2, 0.3],
            viewport: (1200, 800),
            world_generation: 4,
            visible: true,
        };

        let mut buffer = FrameBuffer::new(FrameLayout::new(4));
        buffer.write(&frame);
        let data = buffer.as_slice();

        assert_eq!(data[HEADER_FRAME_COUNTER], 1.0);
        assert_eq!(data[HEADER_VIEWPORT_WIDTH], 1200.0);
        assert_eq!(data[HEADER_LIGHT_COUNT], 2.0);
        assert_eq!(data[HEADER_INSTANCE_COUNT], 1.0);
        assert_eq!(data[HEADER_WORLD_GENERATION], 4.0);
        assert_eq!(data[HEADER_SCENE_VISIBLE], 1.0);

        let layout = buffer.layout().clone();
        assert_eq!(data[layout.light_offset], lights[0].kind);
        assert_eq!(data[layout.light_offset + LIGHT_FLOATS], lights[1].kind);
        assert_eq!(data[layout.instance_offset + 16], 7.0);
    }

    #[test]
    fn overflowing_instances_are_truncated() {
        let cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        let instances = [BodyInstance::default(); 5];
        let frame = FrameData {
            camera: cam.uniform(),
            lights: &[],
            instances: &instances,
            background: [0.0; 3],
            viewport: (1, 1),
            world_generation: 0,
            visible: false,
        };
        let mut buffer = FrameBuffer::new(FrameLayout::new(2));
        buffer.write(&frame);
        assert_eq!(buffer.as_slice()[HEADER_INSTANCE_COUNT], 2.0);
        assert_eq!(buffer.as_slice()[HEADER_LIGHT_COUNT], 0.0);
    }
}
