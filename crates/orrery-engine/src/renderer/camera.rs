use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3};

use crate::api::config::SceneConfig;

/// Perspective camera. Positions are f64 so far bodies keep precision;
/// matrices are narrowed to f32 only when packed for the GPU.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    /// Viewport width / height.
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    /// Eye position in world space.
    pub position: DVec3,
    /// Point the camera looks at.
    pub look_at: DVec3,
    pub up: DVec3,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Eye position (w = 1).
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub const FLOATS: usize = 36;
}

impl PerspectiveCamera {
    pub fn new(fov_deg: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            fov_deg,
            aspect,
            near,
            far,
            position: DVec3::ZERO,
            look_at: DVec3::NEG_Z,
            up: DVec3::Y,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        let mut camera = Self::new(config.fov_deg, config.aspect(), config.near, config.far);
        camera.position = config.initial_eye;
        camera.look_at = config.initial_target;
        camera
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.look_at, self.up)
    }

    /// Right-handed perspective projection, depth in [0, 1].
    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        let eye = self.position.as_vec3();
        CameraUniform {
            view: self.view_matrix().as_mat4().to_cols_array_2d(),
            projection: self.projection_matrix().as_mat4().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        }
    }

    /// Resize the viewport (e.g. on window resize).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f64 / height.max(1) as f64;
    }
}
