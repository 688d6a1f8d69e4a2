//! Renderer trait implemented by draw backends.
//!
//! The engine never touches the GPU. Each frame it assembles a [`FrameData`]
//! snapshot and hands it to whatever implements [`Renderer`]: the web host
//! (frame buffer + WebGPU/three.js on the JS side), or a recording renderer in tests.

use super::camera::CameraUniform;
use super::instance::BodyInstance;
use crate::systems::lighting::LightRecord;

/// Complete frame data for rendering.
pub struct FrameData<'a> {
    /// View, projection and eye position for this frame.
    pub camera: CameraUniform,
    /// Ambient then directional light.
    pub lights: &'a [LightRecord],
    /// One instance per world node, in insertion order.
    pub instances: &'a [BodyInstance],
    /// Clear color, linear RGB 0.0-1.0.
    pub background: [f32; 3],
    /// Drawable size in pixels.
    pub viewport: (u32, u32),
    /// Bumped on every world insertion so the host knows to upload new geometry.
    pub world_generation: u32,
    /// Whether the scene container is currently shown.
    pub visible: bool,
}

/// Renderer trait for draw backends.
///
/// ```ignore
/// struct HostRenderer { buffer: FrameBuffer }
///
/// impl Renderer for HostRenderer {
///     fn backend(&self) -> &'static str { "host" }
///     fn draw(&mut self, frame: &FrameData) { self.buffer.write(frame); }
///     fn resize(&mut self, _width: u32, _height: u32) {}
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g., "host", "recording")
    fn backend(&self) -> &'static str;

    /// Draw one frame of the world as seen by the camera.
    fn draw(&mut self, frame: &FrameData);

    /// Handle drawable resize.
    fn resize(&mut self, width: u32, height: u32);
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingRenderer;
    use super::*;
    use crate::renderer::camera::PerspectiveCamera;

    #[test]
    fn recording_renderer_copies_frames() {
        let mut renderer = RecordingRenderer::default();
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let instances = [BodyInstance { body: 2.0, ..Default::default() }];
        renderer.draw(&FrameData {
            camera: camera.uniform(),
            lights: &[],
            instances: &instances,
            background: [0.0; 3],
            viewport: (640, 480),
            world_generation: 1,
            visible: true,
        });
        renderer.resize(800, 600);

        assert_eq!(renderer.backend(), "recording");
        assert_eq!(renderer.frames.len(), 1);
        assert_eq!(renderer.last().map(|f| f.instances[0].body), Some(2.0));
        assert_eq!(renderer.resizes, vec![(800, 600)]);
    }
}
