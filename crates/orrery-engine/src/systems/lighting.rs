//! Scene lighting: one ambient fill and one directional key light.
//!
//! Lights are fixed for the session. Each frame the engine serializes them
//! into the frame buffer for the host renderer's lighting pass.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;

use crate::api::config::{hex_to_rgb, SceneConfig};

pub const LIGHT_KIND_AMBIENT: f32 = 0.0;
pub const LIGHT_KIND_DIRECTIONAL: f32 = 1.0;

/// Uniform light reaching every surface equally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Parallel light shining from `position` toward `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: DVec3,
    pub target: DVec3,
}

impl DirectionalLight {
    /// Unit vector the light travels along.
    pub fn direction(&self) -> DVec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// Wire format (8 floats / 32 bytes):
/// `[kind, r, g, b, intensity, dx, dy, dz]`
/// Direction is zero for ambient lights.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightRecord {
    pub kind: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub intensity: f32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

#[derive(Debug, Clone)]
pub struct LightRig {
    ambient: AmbientLight,
    directional: DirectionalLight,
}

impl LightRig {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: hex_to_rgb(config.ambient.color),
                intensity: config.ambient.intensity,
            },
            directional: DirectionalLight {
                color: hex_to_rgb(config.directional.color),
                intensity: config.directional.intensity,
                position: config.directional.position,
                target: DVec3::ZERO,
            },
        }
    }

    pub fn ambient(&self) -> &AmbientLight {
        &self.ambient
    }

    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    /// Wire records, ambient first.
    pub fn records(&self) -> [LightRecord; 2] {
        let [r, g, b] = self.ambient.color;
        let ambient = LightRecord {
            kind: LIGHT_KIND_AMBIENT,
            r,
            g,
            b,
            intensity: self.ambient.intensity,
            ..Default::default()
        };
        let [r, g, b] = self.directional.color;
        let dir = self.directional.direction().as_vec3();
        let directional = LightRecord {
            kind: LIGHT_KIND_DIRECTIONAL,
            r,
            g,
            b,
            intensity: self.directional.intensity,
            dx: dir.x,
            dy: dir.y,
            dz: dir.z,
        };
        [ambient, directional]
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}
