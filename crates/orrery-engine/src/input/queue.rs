/// Pointer button driving an orbit gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Rotate around the target.
    Primary,
    /// Dolly toward/away from the target.
    Middle,
    /// Pan the target.
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Input event types the camera rig understands.
/// Coordinates are viewport pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { button: PointerButton, x: f32, y: f32 },
    PointerUp { button: PointerButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    /// Scroll wheel; positive `delta_y` scrolls down (zooms out).
    Wheel { delta_y: f32 },
}

/// A queue of input events.
/// The host pushes events as they arrive; the render loop drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
