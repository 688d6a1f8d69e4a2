use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::api::error::SceneError;

/// Configuration for the scene. Defaults reproduce the stock solar system view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Id of the element hosting the 3D viewport.
    pub container_id: String,
    /// Id of the sibling page view revealed by `exit_scene`.
    pub main_id: String,
    /// Background clear color as 0xRRGGBB.
    pub background: u32,
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Eye position before any focus call.
    pub initial_eye: DVec3,
    /// Orbit target before any focus call.
    pub initial_target: DVec3,
    /// Framing distance used when focus is called without a usable zoom.
    pub default_zoom: f64,
    /// Uniform scale applied to every loaded model.
    pub body_scale: f64,
    pub ambient: LightConfig,
    pub directional: DirectionalConfig,
    pub controls: ControlsConfig,
    /// Initial viewport size in pixels (replaced by the first resize).
    pub viewport_width: u32,
    pub viewport_height: u32,
}

/// Color and intensity of a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub color: u32,
    pub intensity: f32,
}

/// A directional light placed at `position`, shining toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalConfig {
    pub color: u32,
    pub intensity: f32,
    pub position: DVec3,
}

/// Orbit controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied (and decayed) per frame.
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub pan_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f64::INFINITY,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            container_id: "scene-container".to_string(),
            main_id: "main".to_string(),
            background: 0x111111,
            fov_deg: 75.0,
            near: 0.1,
            far: 1_000_000.0,
            initial_eye: DVec3::new(0.0, 2.0, 5.0),
            initial_target: DVec3::ZERO,
            default_zoom: 200.0,
            body_scale: 5.0,
            ambient: LightConfig { color: 0xffffff, intensity: 5.0 },
            directional: DirectionalConfig {
                color: 0xffffff,
                intensity: 10.0,
                position: DVec3::new(-10_000.0, 0.0, 0.0),
            },
            controls: ControlsConfig::default(),
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl SceneConfig {
    /// Parse a configuration, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn background_rgb(&self) -> [f32; 3] {
        hex_to_rgb(self.background)
    }

    pub fn aspect(&self) -> f64 {
        self.viewport_width as f64 / self.viewport_height.max(1) as f64
    }
}

/// Split 0xRRGGBB into normalized channels.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
