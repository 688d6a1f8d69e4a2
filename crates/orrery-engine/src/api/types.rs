use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::error::SceneError;

/// Scene distance units per astronomical unit.
pub const AU: f64 = 1000.0;

/// Unique identifier for a node in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One solar-system body the scene knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyId {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl BodyId {
    pub const COUNT: usize = 10;

    /// Every body, in registry order.
    pub const ALL: [BodyId; Self::COUNT] = [
        BodyId::Sun,
        BodyId::Mercury,
        BodyId::Venus,
        BodyId::Earth,
        BodyId::Moon,
        BodyId::Mars,
        BodyId::Jupiter,
        BodyId::Saturn,
        BodyId::Uranus,
        BodyId::Neptune,
    ];

    /// Lowercase name used by the control surface and asset paths.
    pub fn name(self) -> &'static str {
        match self {
            BodyId::Sun => "sun",
            BodyId::Mercury => "mercury",
            BodyId::Venus => "venus",
            BodyId::Earth => "earth",
            BodyId::Moon => "moon",
            BodyId::Mars => "mars",
            BodyId::Jupiter => "jupiter",
            BodyId::Saturn => "saturn",
            BodyId::Uranus => "uranus",
            BodyId::Neptune => "neptune",
        }
    }

    /// Stable index written into the frame buffer.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyId {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| SceneError::UnknownBody(s.to_string()))
    }
}
