use glam::DVec3;

use crate::api::config::SceneConfig;
use crate::input::queue::InputEvent;
use crate::renderer::camera::PerspectiveCamera;
use crate::renderer::controls::OrbitControls;

/// Vertical share of the framing offset.
const FOCUS_LIFT: f64 = 0.3;

/// Eye and look-at target as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub eye: DVec3,
    pub target: DVec3,
}

/// Perspective camera plus the orbit controller that steers it.
pub struct CameraRig {
    camera: PerspectiveCamera,
    controls: OrbitControls,
    default_zoom: f64,
}

impl CameraRig {
    pub fn new(config: &SceneConfig) -> Self {
        let mut camera = PerspectiveCamera::from_config(config);
        let mut controls = OrbitControls::new(config.controls, config.initial_target, config.viewport_height);
        controls.sync(&mut camera);
        Self {
            camera,
            controls,
            default_zoom: config.default_zoom,
        }
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            eye: self.camera.position,
            target: self.controls.target,
        }
    }

    /// Frame `target` from above and outside along every axis:
    /// eye = target + (o, 0.3·o, o), where o is `zoom`, or the default
    /// framing distance when `zoom` is missing, zero, or NaN.
    pub fn focus(&mut self, target: DVec3, zoom: Option<f64>) {
        let offset = match zoom {
            Some(z) if z != 0.0 && !z.is_nan() => z,
            _ => self.default_zoom,
        };
        self.camera.position = DVec3::new(
            target.x + offset,
            target.y + offset * FOCUS_LIFT,
            target.z + offset,
        );
        self.controls.target = target;
        self.controls.sync(&mut self.camera);
        log::debug!("focus: target={:?} offset={}", target, offset);
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.controls.handle(event, &self.camera);
    }

    /// Advance the controller by one frame.
    pub fn update(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.controls.set_viewport_height(height);
    }
}
