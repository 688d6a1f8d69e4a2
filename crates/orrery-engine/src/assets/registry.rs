use glam::DVec3;

use crate::api::error::SceneError;
use crate::api::types::{BodyId, AU};

/// Where a body sits and how far back the camera frames it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusConfig {
    pub position: DVec3,
    /// Preferred camera framing distance. Always > 0.
    pub zoom: f64,
}

/// Static table of body positions and framing distances.
/// Bodies are spread along the x axis, one AU = 1000 scene units.
pub struct BodyRegistry {
    entries: [FocusConfig; BodyId::COUNT],
}

impl BodyRegistry {
    pub fn new() -> Self {
        let entry = |x: f64, y: f64, z: f64, zoom: f64| FocusConfig {
            position: DVec3::new(AU * x, AU * y, AU * z),
            zoom,
        };
        Self {
            // Indexed by BodyId::index().
            entries: [
                entry(-1.0, 0.0, 1.0, 100.0), // sun
                entry(-0.61, 0.0, 0.0, 1.0),  // mercury
                entry(-0.28, 0.0, 0.0, 1.0),  // venus
                entry(0.0, 0.0, 0.0, 1.0),    // earth
                entry(0.0, 0.01, 0.0, 1.0),   // moon
                entry(0.52, 0.0, 0.0, 1.0),   // mars
                entry(4.20, 0.0, 0.0, 10.0),  // jupiter
                entry(8.58, 0.0, 0.0, 10.0),  // saturn
                entry(18.22, 0.0, 0.0, 10.0), // uranus
                entry(29.07, 0.0, 0.0, 10.0), // neptune
            ],
        }
    }

    /// Framing for a known body. Total over `BodyId`.
    pub fn lookup(&self, id: BodyId) -> FocusConfig {
        self.entries[id.index()]
    }

    /// Strict lookup by name. Unknown names are an error.
    pub fn lookup_name(&self, name: &str) -> Result<FocusConfig, SceneError> {
        let id: BodyId = name.parse()?;
        Ok(self.lookup(id))
    }

    /// Iterate every body with its framing, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, FocusConfig)> + '_ {
        BodyId::ALL.iter().map(move |&id| (id, self.lookup(id)))
    }
}

impl Default for BodyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
