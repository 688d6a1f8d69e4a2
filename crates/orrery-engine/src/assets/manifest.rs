use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::api::error::SceneError;
use crate::api::types::BodyId;
use crate::assets::registry::BodyRegistry;

/// Asset manifest describing which model to load for each body.
/// Loaded from a JSON file at runtime, or built from the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub models: Vec<ModelDescriptor>,
}

/// One model to fetch and place in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub body: BodyId,
    /// Relative path or URL of the .glb file (e.g., "public/earth.glb").
    pub path: String,
    /// Uniform scale (default: 5).
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// World position; defaults to the body's registry position.
    #[serde(default)]
    pub position: Option<DVec3>,
}

fn default_scale() -> f64 {
    5.0
}

impl AssetManifest {
    /// Parse a manifest from a JSON string. Every scale must be finite and positive.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let manifest: Self = serde_json::from_str(json)?;
        for model in &manifest.models {
            if !(model.scale.is_finite() && model.scale > 0.0) {
                return Err(SceneError::InvalidScale {
                    body: model.body,
                    scale: model.scale,
                });
            }
        }
        Ok(manifest)
    }

    /// One `public/<body>.glb` per registry entry, placed at the registry position.
    pub fn from_registry(registry: &BodyRegistry, scale: f64) -> Self {
        let models = registry
            .iter()
            .map(|(body, focus)| ModelDescriptor {
                body,
                path: format!("public/{}.glb", body.name()),
                scale,
                position: Some(focus.position),
            })
            .collect();
        Self { models }
    }
}

impl ModelDescriptor {
    /// Placement for this model, falling back to the registry.
    pub fn resolved_position(&self, registry: &BodyRegistry) -> DVec3 {
        self.position
            .unwrap_or_else(|| registry.lookup(self.body).position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_manifest_covers_every_body() {
        let reg = BodyRegistry::new();
        let manifest = AssetManifest::from_registry(&reg, 5.0);
        assert_eq!(manifest.models.len(), BodyId::COUNT);

        let neptune = manifest.models.iter().find(|m| m.body == BodyId::Neptune).unwrap();
        assert_eq!(neptune.path, "public/neptune.glb");
        assert_eq!(neptune.scale, 5.0);
        assert_eq!(neptune.position, Some(DVec3::new(29_070.0, 0.0, 0.0)));
    }

    #[test]
    fn parse_minimal_manifest() {
        let json = r#"{
            "models": [
                { "body": "earth", "path": "models/earth.glb" },
                { "body": "moon", "path": "models/moon.glb", "scale": 2.5, "position": [1.0, 2.0, 3.0] }
            ]
        }"#;
        let manifest = AssetManifest::from_json(json).unwrap();
        let reg = BodyRegistry::new();

        let earth = &manifest.models[0];
        assert_eq!(earth.body, BodyId::Earth);
        assert_eq!(earth.scale, 5.0);
        assert_eq!(earth.resolved_position(&reg), DVec3::ZERO);

        let moon = &manifest.models[1];
        assert_eq!(moon.scale, 2.5);
        assert_eq!(moon.resolved_position(&reg), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unknown_body_in_manifest_is_rejected() {
        let json = r#"{ "models": [ { "body": "pluto", "path": "pluto.glb" } ] }"#;
        assert!(AssetManifest::from_json(json).is_err());
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for scale in ["0", "-2.5"] {
            let json = format!(r#"{{ "models": [ {{ "body": "venus", "path": "venus.glb", "scale": {} }} ] }}"#, scale);
            assert!(matches!(
                AssetManifest::from_json(&json),
                Err(SceneError::InvalidScale { body: BodyId::Venus, .. })
            ));
        }
    }
}
