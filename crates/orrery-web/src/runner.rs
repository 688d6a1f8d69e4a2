use orrery_engine::{
    AssetManifest, FrameBuffer, FrameLayout, InputEvent, LoadEvent, LoadRequest, LoadTicket,
    MeshNode, NodeId, SceneConfig, SceneError, Surface, Viewport,
};

use crate::host::HostRenderer;

/// Owns the viewport and the frame buffer the JS renderer reads.
///
/// The wasm exports in `lib.rs` keep one `SceneRunner` in a `thread_local!`,
/// because wasm-bindgen cannot export the engine types directly.
pub struct SceneRunner {
    viewport: Viewport,
    renderer: HostRenderer,
    manifest: AssetManifest,
    started: bool,
}

impl SceneRunner {
    pub fn new(config: SceneConfig) -> Self {
        let viewport = Viewport::new(config);
        let manifest = viewport.default_manifest();
        let layout = FrameLayout::default();
        Self {
            viewport,
            renderer: HostRenderer::new(FrameBuffer::new(layout)),
            manifest,
            started: false,
        }
    }

    /// Replace the manifest used by the next `start`.
    pub fn load_manifest(&mut self, json: &str) -> Result<(), SceneError> {
        self.manifest = AssetManifest::from_json(json)?;
        log::info!("manifest: {} models", self.manifest.models.len());
        Ok(())
    }

    /// Show the scene and hand out the load requests the host must fetch.
    /// Loads are requested once; later calls only re-show the scene.
    pub fn start(&mut self, surface: &mut impl Surface) -> Result<Vec<LoadRequest>, SceneError> {
        self.viewport.show(surface)?;
        if self.started {
            return Ok(Vec::new());
        }
        self.started = true;
        Ok(self.viewport.start_loads(&self.manifest))
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.viewport.push_input(event);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height, &mut self.renderer);
    }

    pub fn focus_on_planet(&mut self, name: &str) -> bool {
        self.viewport.focus_on_planet(name)
    }

    pub fn exit_scene(&mut self, surface: &mut impl Surface) -> Result<(), SceneError> {
        self.viewport.exit_scene(surface)
    }

    pub fn load_progress(&mut self, ticket: LoadTicket, loaded: u64, total: Option<u64>) {
        self.viewport.load_progress(ticket, loaded, total);
    }

    pub fn complete_load(&mut self, ticket: LoadTicket, bytes: &[u8]) -> Option<NodeId> {
        self.viewport.complete_load(ticket, bytes)
    }

    pub fn fail_load(&mut self, ticket: LoadTicket, error: SceneError) {
        self.viewport.fail_load(ticket, error);
    }

    /// Cancel every pending load; later completions for them are ignored.
    pub fn cancel_loads(&mut self) -> usize {
        self.viewport.cancel_loads()
    }

    pub fn drain_load_events(&mut self) -> Vec<LoadEvent> {
        self.viewport.drain_load_events()
    }

    /// Run one render loop cycle into the frame buffer.
    pub fn frame(&mut self) {
        self.viewport.frame(&mut self.renderer);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // ---- Frame buffer accessors ----

    pub fn frame_ptr(&self) -> *const f32 {
        self.renderer.buffer().as_ptr()
    }

    pub fn frame_len(&self) -> u32 {
        self.renderer.buffer().len() as u32
    }

    pub fn world_generation(&self) -> u32 {
        self.viewport.world().generation()
    }

    // ---- Geometry accessors (read once per node on upload) ----

    pub fn node_count(&self) -> u32 {
        self.viewport.world().len() as u32
    }

    /// Registry index of the body a node shows, or -1 when out of range.
    pub fn node_body(&self, node: u32) -> i32 {
        self.viewport
            .world()
            .node_at(node as usize)
            .map_or(-1, |n| n.body.index() as i32)
    }

    pub fn mesh_count(&self, node: u32) -> u32 {
        self.viewport
            .world()
            .node_at(node as usize)
            .map_or(0, |n| n.model.mesh_count() as u32)
    }

    fn mesh(&self, node: u32, mesh: u32) -> Option<&MeshNode> {
        self.viewport
            .world()
            .node_at(node as usize)?
            .model
            .nodes
            .get(mesh as usize)
    }

    pub fn mesh_positions(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .map(|m| m.geometry.positions.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn mesh_normals(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .map(|m| m.geometry.normals.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Triangle indices; empty for non-indexed meshes.
    pub fn mesh_indices(&self, node: u32, mesh: u32) -> Vec<u32> {
        self.mesh(node, mesh)
            .and_then(|m| m.geometry.indices.clone())
            .unwrap_or_default()
    }

    /// Mesh-to-model transform, column-major.
    pub fn mesh_transform(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .map(|m| m.transform.to_cols_array().to_vec())
            .unwrap_or_default()
    }

    /// Interleaved `TEXCOORD_0` pairs; empty when the mesh has none.
    pub fn mesh_uvs(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .map(|m| m.geometry.uvs.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Base color factor as RGBA.
    pub fn mesh_base_color(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .map(|m| m.material.base_color.to_vec())
            .unwrap_or_default()
    }

    /// Encoded base color image bytes; empty when the mesh is untextured.
    pub fn mesh_texture(&self, node: u32, mesh: u32) -> Vec<u8> {
        self.mesh(node, mesh)
            .and_then(|m| m.material.base_color_texture.as_ref())
            .map(|t| t.bytes.clone())
            .unwrap_or_default()
    }

    pub fn mesh_texture_mime(&self, node: u32, mesh: u32) -> Option<String> {
        self.mesh(node, mesh)
            .and_then(|m| m.material.base_color_texture.as_ref())
            .map(|t| t.mime_type.clone())
    }

    /// [center xyz, radius] of the mesh bounding sphere.
    pub fn mesh_bounds(&self, node: u32, mesh: u32) -> Vec<f32> {
        self.mesh(node, mesh)
            .and_then(|m| m.geometry.bounding_sphere)
            .map(|s| vec![s.center.x, s.center.y, s.center.z, s.radius])
            .unwrap_or_default()
    }
}

impl Default for SceneRunner {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_engine::bridge::protocol::{HEADER_INSTANCE_COUNT, HEADER_WORLD_GENERATION};
    use orrery_engine::{BodyId, Display};
    use std::collections::HashMap;

    struct Page(HashMap<String, Display>);

    impl Page {
        fn new() -> Self {
            let mut map = HashMap::new();
            map.insert("scene-container".to_string(), Display::None);
            map.insert("main".to_string(), Display::Block);
            Self(map)
        }
    }

    impl Surface for Page {
        fn has_element(&self, id: &str) -> bool {
            self.0.contains_key(id)
        }

        fn set_display(&mut self, id: &str, display: Display) -> Result<(), SceneError> {
            let slot = self
                .0
                .get_mut(id)
                .ok_or_else(|| SceneError::MissingElement(id.to_string()))?;
            *slot = display;
            Ok(())
        }
    }

    fn push_f32s(bin: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            bin.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// Minimal GLB: one triangle with float UVs, a tinted material and an embedded image.
    fn textured_triangle() -> Vec<u8> {
        let mut bin = Vec::new();
        push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        push_f32s(&mut bin, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        bin.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        let json = r#"{
            "nodes": [ { "mesh": 0 } ],
            "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "material": 0 } ] } ],
            "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.5, 1.0, 1.0], "baseColorTexture": { "index": 0 } } } ],
            "textures": [ { "source": 0 } ],
            "images": [ { "bufferView": 2, "mimeType": "image/jpeg" } ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
                { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
                { "buffer": 0, "byteOffset": 60, "byteLength": 4 }
            ],
            "buffers": [ { "byteLength": 64 } ]
        }"#;
        let mut json_bytes = json.as_bytes().to_vec();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }
        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        for word in [0x4654_6C67u32, 2, total as u32, json_bytes.len() as u32, 0x4E4F_534A] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&json_bytes);
        for word in [bin.len() as u32, 0x004E_4942] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&bin);
        out
    }

    fn read_frame(runner: &SceneRunner) -> &[f32] {
        // SAFETY: pointer and length come from the live frame buffer.
        unsafe { std::slice::from_raw_parts(runner.frame_ptr(), runner.frame_len() as usize) }
    }

    #[test]
    fn start_requests_every_body_once() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        let requests = runner.start(&mut page).unwrap();
        assert_eq!(requests.len(), BodyId::COUNT);
        assert_eq!(requests[7].path, "public/saturn.glb");
        assert!(runner.start(&mut page).unwrap().is_empty());
    }

    #[test]
    fn custom_manifest_replaces_default() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        runner
            .load_manifest(r#"{ "models": [ { "body": "moon", "path": "assets/moon.glb", "scale": 2 } ] }"#)
            .unwrap();
        let requests = runner.start(&mut page).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].scale, 2.0);
        assert!(runner.load_manifest("{ nope").is_err());
    }

    #[test]
    fn manifest_with_zero_scale_is_refused() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        let err = runner
            .load_manifest(r#"{ "models": [ { "body": "moon", "path": "moon.glb", "scale": 0 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidScale { body: BodyId::Moon, .. }));
        // The default manifest stays in place.
        assert_eq!(runner.start(&mut page).unwrap().len(), BodyId::COUNT);
    }

    #[test]
    fn material_accessors_expose_uvs_color_and_image() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        let requests = runner.start(&mut page).unwrap();
        assert!(runner.complete_load(requests[3].ticket, &textured_triangle()).is_some());

        assert_eq!(runner.mesh_count(0), 1);
        assert_eq!(runner.mesh_uvs(0, 0), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(runner.mesh_base_color(0, 0), vec![0.5, 0.5, 1.0, 1.0]);
        assert_eq!(runner.mesh_texture(0, 0), vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(runner.mesh_texture_mime(0, 0).as_deref(), Some("image/jpeg"));
        assert_eq!(runner.mesh_texture_mime(0, 1), None);
        assert!(runner.mesh_base_color(5, 0).is_empty());
    }

    #[test]
    fn cancelled_loads_ignore_late_results() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        let requests = runner.start(&mut page).unwrap();
        assert_eq!(runner.cancel_loads(), BodyId::COUNT);

        // An aborted fetch reports failure and a finished one reports bytes; both are dropped.
        runner.fail_load(
            requests[0].ticket,
            SceneError::Fetch {
                path: requests[0].path.clone(),
                reason: "AbortError".into(),
            },
        );
        assert!(runner.complete_load(requests[1].ticket, &textured_triangle()).is_none());
        assert_eq!(runner.node_count(), 0);

        let events = runner.drain_load_events();
        assert_eq!(events.len(), BodyId::COUNT);
        assert!(events.iter().all(|e| matches!(e, LoadEvent::Cancelled { .. })));
    }

    #[test]
    fn frame_buffer_reflects_world() {
        let mut page = Page::new();
        let mut runner = SceneRunner::default();
        let requests = runner.start(&mut page).unwrap();
        runner.fail_load(
            requests[0].ticket,
            SceneError::Fetch {
                path: requests[0].path.clone(),
                reason: "offline".into(),
            },
        );
        runner.frame();

        let frame = read_frame(&runner);
        assert_eq!(frame[HEADER_INSTANCE_COUNT], 0.0);
        assert_eq!(frame[HEADER_WORLD_GENERATION], 0.0);
        assert_eq!(runner.node_count(), 0);
        assert_eq!(runner.node_body(0), -1);
        assert!(runner.mesh_positions(0, 0).is_empty());
        assert!(matches!(
            runner.drain_load_events().as_slice(),
            [LoadEvent::Failed { body: BodyId::Sun, .. }]
        ));
    }
}
