use orrery_engine::{FrameBuffer, FrameData, Renderer};

/// Serializes frames into the shared buffer. The JS renderer does the drawing.
pub struct HostRenderer {
    buffer: FrameBuffer,
    size: (u32, u32),
}

impl HostRenderer {
    pub fn new(buffer: FrameBuffer) -> Self {
        Self { buffer, size: (0, 0) }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Renderer for HostRenderer {
    fn backend(&self) -> &'static str {
        "host"
    }

    fn draw(&mut self, frame: &FrameData) {
        self.buffer.write(frame);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_engine::bridge::protocol::HEADER_VIEWPORT_HEIGHT;
    use orrery_engine::{FrameLayout, Viewport};

    #[test]
    fn draw_writes_frame_buffer() {
        let mut host = HostRenderer::new(FrameBuffer::new(FrameLayout::default()));
        let mut viewport = Viewport::default();
        viewport.resize(640, 360, &mut host);
        viewport.frame(&mut host);

        assert_eq!(host.size(), (640, 360));
        assert_eq!(host.buffer().frame_counter(), 1);
        assert_eq!(host.buffer().as_slice()[HEADER_VIEWPORT_HEIGHT], 360.0);
    }
}
