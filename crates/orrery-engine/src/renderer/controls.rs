//! Orbit controller: drag to rotate around a target, wheel to dolly,
//! secondary drag to pan. Optional damping carries motion across frames.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::api::config::ControlsConfig;
use crate::input::queue::{InputEvent, PointerButton};
use crate::renderer::camera::PerspectiveCamera;

/// Keeps the polar angle off the poles so `look_at` never degenerates.
const POLE_EPSILON: f64 = 1e-6;
/// Residual damped motion below this is dropped.
const SETTLE_EPSILON: f64 = 1e-9;
/// Dolly factor per wheel notch at zoom speed 1.
const WHEEL_ZOOM_BASE: f64 = 0.95;

/// Spherical coordinates around the Y axis.
/// `phi` is the polar angle from +Y, `theta` the azimuth from +Z toward +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f64,
    pub phi: f64,
    pub theta: f64,
}

impl Spherical {
    pub fn from_offset(v: DVec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self { radius, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> DVec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        DVec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    None,
    Rotate,
    Dolly,
    Pan,
}

/// Interactive orbit controller around a look-at target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: DVec3,
    config: ControlsConfig,
    /// Pending rotation (theta, phi) in radians.
    delta_theta: f64,
    delta_phi: f64,
    /// Pending radius multiplier.
    scale: f64,
    pan_offset: DVec3,
    gesture: Gesture,
    last_pointer: (f32, f32),
    viewport_height: f64,
    /// Orientation derived on the last update.
    spherical: Spherical,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig, target: DVec3, viewport_height: u32) -> Self {
        Self {
            target,
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: DVec3::ZERO,
            gesture: Gesture::None,
            last_pointer: (0.0, 0.0),
            viewport_height: viewport_height.max(1) as f64,
            spherical: Spherical { radius: 0.0, phi: 0.0, theta: 0.0 },
        }
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f64;
    }

    /// Whether motion is still queued (input or damping residue).
    pub fn has_pending_motion(&self) -> bool {
        self.delta_theta != 0.0
            || self.delta_phi != 0.0
            || self.scale != 1.0
            || self.pan_offset != DVec3::ZERO
    }

    /// Drop any queued motion and re-derive orientation from the camera as-is.
    /// The eye does not move.
    pub fn sync(&mut self, camera: &mut PerspectiveCamera) {
        self.clear_motion();
        self.spherical = Spherical::from_offset(camera.position - self.target);
        camera.look_at = self.target;
    }

    /// Feed one pointer/wheel event into the controller.
    pub fn handle(&mut self, event: &InputEvent, camera: &PerspectiveCamera) {
        match *event {
            InputEvent::PointerDown { button, x, y } => {
                self.gesture = match button {
                    PointerButton::Primary => Gesture::Rotate,
                    PointerButton::Middle => Gesture::Dolly,
                    PointerButton::Secondary => Gesture::Pan,
                };
                self.last_pointer = (x, y);
            }
            InputEvent::PointerUp { .. } => {
                self.gesture = Gesture::None;
            }
            InputEvent::PointerMove { x, y } => {
                let dx = (x - self.last_pointer.0) as f64;
                let dy = (y - self.last_pointer.1) as f64;
                self.last_pointer = (x, y);
                match self.gesture {
                    Gesture::None => {}
                    Gesture::Rotate => {
                        let k = TAU * self.config.rotate_speed / self.viewport_height;
                        self.delta_theta -= k * dx;
                        self.delta_phi -= k * dy;
                    }
                    Gesture::Dolly => {
                        let zoom = self.zoom_scale();
                        if dy > 0.0 {
                            self.scale /= zoom;
                        } else if dy < 0.0 {
                            self.scale *= zoom;
                        }
                    }
                    Gesture::Pan => self.pan(dx, dy, camera),
                }
            }
            InputEvent::Wheel { delta_y } => {
                let zoom = self.zoom_scale();
                if delta_y < 0.0 {
                    self.scale *= zoom;
                } else if delta_y > 0.0 {
                    self.scale /= zoom;
                }
            }
        }
    }

    fn zoom_scale(&self) -> f64 {
        WHEEL_ZOOM_BASE.powf(self.config.zoom_speed)
    }

    /// Translate the target in the view plane, scaled so the point under the
    /// cursor tracks the pointer at the target's depth.
    fn pan(&mut self, dx: f64, dy: f64, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_deg.to_radians() / 2.0).tan();
        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);
        let k = 2.0 * target_distance * self.config.pan_speed / self.viewport_height;
        self.pan_offset += -right * (dx * k) + up * (dy * k);
    }

    /// Apply queued motion to the camera. Returns true if the eye moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if !self.has_pending_motion() {
            camera.look_at = self.target;
            return false;
        }

        let mut spherical = Spherical::from_offset(camera.position - self.target);
        let damping = self.config.enable_damping;
        let f = if damping { self.config.damping_factor } else { 1.0 };

        spherical.theta += self.delta_theta * f;
        spherical.phi += self.delta_phi * f;
        spherical.phi = spherical.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        self.target += self.pan_offset * f;
        camera.position = self.target + spherical.to_offset();
        camera.look_at = self.target;
        self.spherical = spherical;

        if damping {
            let decay = 1.0 - self.config.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
            if self.delta_theta.abs() < SETTLE_EPSILON {
                self.delta_theta = 0.0;
            }
            if self.delta_phi.abs() < SETTLE_EPSILON {
                self.delta_phi = 0.0;
            }
            if self.pan_offset.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON {
                self.pan_offset = DVec3::ZERO;
            }
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = DVec3::ZERO;
        }
        self.scale = 1.0;
        true
    }

    fn clear_motion(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = DVec3::ZERO;
    }
}
