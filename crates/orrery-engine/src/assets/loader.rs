use std::collections::HashMap;

use glam::DVec3;

use crate::api::error::SceneError;
use crate::api::types::{BodyId, NodeId};
use crate::assets::glb::{parse_glb, ModelAsset};
use crate::assets::manifest::{AssetManifest, ModelDescriptor};
use crate::assets::registry::BodyRegistry;
use crate::components::body::SceneNode;
use crate::core::world::World;

/// Handle for one in-flight model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u32);

/// Everything the host needs to fetch a model and hand the bytes back.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub body: BodyId,
    pub path: String,
    pub scale: f64,
    pub position: DVec3,
}

/// Notifications emitted while loads run. Observational only.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Progress {
        ticket: LoadTicket,
        body: BodyId,
        loaded: u64,
        /// Total size when the host knows it.
        total: Option<u64>,
    },
    Loaded {
        ticket: LoadTicket,
        body: BodyId,
        node: NodeId,
    },
    Failed {
        ticket: LoadTicket,
        body: BodyId,
        reason: String,
    },
    Cancelled {
        ticket: LoadTicket,
        body: BodyId,
    },
}

impl LoadEvent {
    /// Completed share of a progress event, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            LoadEvent::Progress { loaded, total: Some(total), .. } if *total > 0 => {
                Some((*loaded as f64 / *total as f64).min(1.0))
            }
            _ => None,
        }
    }
}

/// Tracks pending model loads and turns delivered bytes into world nodes.
///
/// Retrieval is the host's job: `load` hands out a [`LoadRequest`], the host
/// fetches `path` however it likes and reports back through `progress`,
/// `complete` or `fail`. Completions may arrive in any order; each ticket
/// resolves at most once.
pub struct AssetLoader {
    pending: HashMap<LoadTicket, LoadRequest>,
    next_ticket: u32,
    events: Vec<LoadEvent>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_ticket: 1,
            events: Vec::new(),
        }
    }

    /// Start loading the model at `path` for `body`.
    pub fn load(&mut self, body: BodyId, path: impl Into<String>, scale: f64, position: DVec3) -> LoadRequest {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        let request = LoadRequest {
            ticket,
            body,
            path: path.into(),
            scale,
            position,
        };
        log::debug!("load {:?}: {} from {}", ticket, body, request.path);
        self.pending.insert(ticket, request.clone());
        request
    }

    pub fn load_descriptor(&mut self, descriptor: &ModelDescriptor, registry: &BodyRegistry) -> LoadRequest {
        self.load(
            descriptor.body,
            descriptor.path.clone(),
            descriptor.scale,
            descriptor.resolved_position(registry),
        )
    }

    /// Start one load per manifest entry, in manifest order.
    pub fn load_manifest(&mut self, manifest: &AssetManifest, registry: &BodyRegistry) -> Vec<LoadRequest> {
        manifest
            .models
            .iter()
            .map(|descriptor| self.load_descriptor(descriptor, registry))
            .collect()
    }

    /// Record download progress. Ignored for tickets that are no longer pending.
    pub fn progress(&mut self, ticket: LoadTicket, loaded: u64, total: Option<u64>) {
        if let Some(request) = self.pending.get(&ticket) {
            self.events.push(LoadEvent::Progress {
                ticket,
                body: request.body,
                loaded,
                total,
            });
        }
    }

    /// Decode delivered bytes and insert the model into `world`.
    ///
    /// Returns the new node on success. Decode failures are logged and
    /// reported as [`LoadEvent::Failed`], leaving the world untouched.
    /// Completions for cancelled, finished or unknown tickets are ignored.
    pub fn complete(&mut self, ticket: LoadTicket, bytes: &[u8], world: &mut World) -> Option<NodeId> {
        let request = match self.pending.remove(&ticket) {
            Some(r) => r,
            None => {
                log::debug!("ignoring completion for inactive {:?}", ticket);
                return None;
            }
        };

        match decode(&request, bytes) {
            Ok(model) => {
                let id = world.next_id();
                let node = SceneNode::new(id, request.body, model)
                    .with_source(request.path.clone())
                    .with_position(request.position)
                    .with_scale(request.scale);
                world.insert(node);
                log::info!("loaded {} ({})", request.body, request.path);
                self.events.push(LoadEvent::Loaded {
                    ticket,
                    body: request.body,
                    node: id,
                });
                Some(id)
            }
            Err(err) => {
                self.report_failure(&request, &err);
                None
            }
        }
    }

    /// Report that the host could not retrieve the bytes for `ticket`.
    pub fn fail(&mut self, ticket: LoadTicket, error: SceneError) {
        if let Some(request) = self.pending.remove(&ticket) {
            self.report_failure(&request, &error);
        }
    }

    /// Cancel one pending load. Returns false when it was not pending.
    pub fn cancel(&mut self, ticket: LoadTicket) -> bool {
        match self.pending.remove(&ticket) {
            Some(request) => {
                self.events.push(LoadEvent::Cancelled {
                    ticket,
                    body: request.body,
                });
                true
            }
            None => false,
        }
    }

    /// Cancel every pending load. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut tickets: Vec<LoadTicket> = self.pending.keys().copied().collect();
        tickets.sort();
        for &ticket in &tickets {
            self.cancel(ticket);
        }
        tickets.len()
    }

    pub fn is_pending(&self, ticket: LoadTicket) -> bool {
        self.pending.contains_key(&ticket)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LoadEvent> {
        std::mem::take(&mut self.events)
    }

    fn report_failure(&mut self, request: &LoadRequest, error: &SceneError) {
        log::error!("{} failed to load: {}", request.body, error);
        self.events.push(LoadEvent::Failed {
            ticket: request.ticket,
            body: request.body,
            reason: error.to_string(),
        });
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(request: &LoadRequest, bytes: &[u8]) -> Result<ModelAsset, SceneError> {
    let mut model = parse_glb(bytes).map_err(|source| SceneError::Glb {
        path: request.path.clone(),
        source,
    })?;
    for node in &mut model.nodes {
        node.normalize();
    }
    Ok(model)
}
