use crate::api::config::SceneConfig;
use crate::api::error::SceneError;
use crate::api::types::{BodyId, NodeId};
use crate::assets::loader::{AssetLoader, LoadEvent, LoadRequest, LoadTicket};
use crate::assets::manifest::AssetManifest;
use crate::assets::registry::BodyRegistry;
use crate::core::world::World;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::instance::InstanceBuffer;
use crate::renderer::rig::{CameraRig, CameraState};
use crate::renderer::traits::{FrameData, Renderer};
use crate::systems::render::build_instance_buffer;

/// CSS display state of a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    None,
}

impl Display {
    pub fn as_css(self) -> &'static str {
        match self {
            Display::Block => "block",
            Display::None => "none",
        }
    }
}

/// The page elements the viewport shows and hides.
pub trait Surface {
    fn has_element(&self, id: &str) -> bool;

    fn set_display(&mut self, id: &str, display: Display) -> Result<(), SceneError>;
}

/// One solar system view: the world, the camera looking at it, and the
/// loads filling it. Everything the exported controls touch lives here.
pub struct Viewport {
    config: SceneConfig,
    registry: BodyRegistry,
    world: World,
    rig: CameraRig,
    loader: AssetLoader,
    input: InputQueue,
    instances: InstanceBuffer,
    size: (u32, u32),
    visible: bool,
}

impl Viewport {
    pub fn new(config: SceneConfig) -> Self {
        let world = World::new(&config);
        let rig = CameraRig::new(&config);
        let size = (config.viewport_width, config.viewport_height);
        Self {
            config,
            registry: BodyRegistry::new(),
            world,
            rig,
            loader: AssetLoader::new(),
            input: InputQueue::new(),
            instances: InstanceBuffer::with_capacity(BodyId::COUNT),
            size,
            visible: false,
        }
    }

    /// Reveal the scene container. Fails when the container is absent.
    pub fn show(&mut self, surface: &mut impl Surface) -> Result<(), SceneError> {
        let container = &self.config.container_id;
        if !surface.has_element(container) {
            return Err(SceneError::MissingElement(container.clone()));
        }
        surface.set_display(container, Display::Block)?;
        self.visible = true;
        log::info!("scene shown in #{}", container);
        Ok(())
    }

    /// Hide the scene and return to the main page.
    /// Repeated calls leave the page in the same state. The render loop keeps running.
    pub fn exit_scene(&mut self, surface: &mut impl Surface) -> Result<(), SceneError> {
        surface.set_display(&self.config.container_id, Display::None)?;
        surface.set_display(&self.config.main_id, Display::Block)?;
        self.visible = false;
        Ok(())
    }

    /// Point the camera at a body by name. Unknown names leave the camera
    /// unchanged; returns whether the camera moved.
    pub fn focus_on_planet(&mut self, name: &str) -> bool {
        match name.parse::<BodyId>() {
            Ok(body) => {
                self.focus_on(body);
                true
            }
            Err(_) => {
                log::debug!("focusOnPlanet: ignoring unknown body '{}'", name);
                false
            }
        }
    }

    pub fn focus_on(&mut self, body: BodyId) {
        let focus = self.registry.lookup(body);
        self.rig.focus(focus.position, Some(focus.zoom));
        log::info!("focus on {}", body);
    }

    /// Update camera aspect and the renderer's drawable size.
    pub fn resize(&mut self, width: u32, height: u32, renderer: &mut impl Renderer) {
        let width = width.max(1);
        let height = height.max(1);
        self.size = (width, height);
        self.rig.resize(width, height);
        renderer.resize(width, height);
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// The manifest used when none is supplied: every registry body.
    pub fn default_manifest(&self) -> AssetManifest {
        AssetManifest::from_registry(&self.registry, self.config.body_scale)
    }

    /// Start every load in `manifest`. The host fetches each request's path.
    pub fn start_loads(&mut self, manifest: &AssetManifest) -> Vec<LoadRequest> {
        let requests = self.loader.load_manifest(manifest, &self.registry);
        log::info!("requested {} models", requests.len());
        requests
    }

    pub fn load_progress(&mut self, ticket: LoadTicket, loaded: u64, total: Option<u64>) {
        self.loader.progress(ticket, loaded, total);
    }

    pub fn complete_load(&mut self, ticket: LoadTicket, bytes: &[u8]) -> Option<NodeId> {
        self.loader.complete(ticket, bytes, &mut self.world)
    }

    pub fn fail_load(&mut self, ticket: LoadTicket, error: SceneError) {
        self.loader.fail(ticket, error);
    }

    pub fn cancel_loads(&mut self) -> usize {
        self.loader.cancel_all()
    }

    pub fn drain_load_events(&mut self) -> Vec<LoadEvent> {
        self.loader.drain_events()
    }

    /// One render loop cycle: apply input, advance the controller, draw.
    pub fn frame(&mut self, renderer: &mut impl Renderer) {
        for event in self.input.drain() {
            self.rig.handle_input(&event);
        }
        self.rig.update();

        build_instance_buffer(self.world.iter(), &mut self.instances);
        let lights = self.world.lights().records();

        renderer.draw(&FrameData {
            camera: self.rig.camera().uniform(),
            lights: &lights,
            instances: &self.instances.instances,
            background: self.world.background(),
            viewport: self.size,
            world_generation: self.world.generation(),
            visible: self.visible,
        });
    }

    // -- Accessors --

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera_state(&self) -> CameraState {
        self.rig.state()
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::glb::fixtures::triangle_glb;
    use crate::input::queue::PointerButton;
    use crate::renderer::traits::recording::RecordingRenderer;
    use glam::DVec3;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakePage {
        elements: HashMap<String, Display>,
    }

    impl FakePage {
        fn standard() -> Self {
            let mut page = Self::default();
            page.elements.insert("scene-container".into(), Display::None);
            page.elements.insert("main".into(), Display::Block);
            page
        }

        fn display(&self, id: &str) -> Option<Display> {
            self.elements.get(id).copied()
        }
    }

    impl Surface for FakePage {
        fn has_element(&self, id: &str) -> bool {
            self.elements.contains_key(id)
        }

        fn set_display(&mut self, id: &str, display: Display) -> Result<(), SceneError> {
            match self.elements.get_mut(id) {
                Some(d) => {
                    *d = display;
                    Ok(())
                }
                None => Err(SceneError::MissingElement(id.to_string())),
            }
        }
    }

    #[test]
    fn unknown_planet_is_ignored() {
        let mut vp = Viewport::default();
        vp.focus_on_planet("earth");
        let before = vp.camera_state();

        assert!(!vp.focus_on_planet("pluto"));
        assert!(!vp.focus_on_planet(""));
        assert_eq!(vp.camera_state(), before);
    }

    #[test]
    fn focus_on_saturn() {
        let mut vp = Viewport::default();
        assert!(vp.focus_on_planet("saturn"));
        let state = vp.camera_state();
        assert_eq!(state.target, DVec3::new(8580.0, 0.0, 0.0));
        assert_eq!(state.eye, DVec3::new(8590.0, 3.0, 10.0));
    }

    #[test]
    fn focus_on_earth() {
        let mut vp = Viewport::default();
        assert!(vp.focus_on_planet("earth"));
        let state = vp.camera_state();
        assert_eq!(state.target, DVec3::ZERO);
        assert_eq!(state.eye, DVec3::new(1.0, 0.3, 1.0));
    }

    #[test]
    fn exit_scene_hides_container_and_shows_main() {
        let mut page = FakePage::standard();
        let mut vp = Viewport::default();
        vp.show(&mut page).unwrap();
        assert_eq!(page.display("scene-container"), Some(Display::Block));

        vp.exit_scene(&mut page).unwrap();
        assert_eq!(page.display("scene-container"), Some(Display::None));
        assert_eq!(page.display("main"), Some(Display::Block));
        assert!(!vp.is_visible());

        vp.exit_scene(&mut page).unwrap();
        assert_eq!(page.display("scene-container"), Some(Display::None));
        assert_eq!(page.display("main"), Some(Display::Block));
    }

    #[test]
    fn render_loop_keeps_drawing_after_exit() {
        let mut page = FakePage::standard();
        let mut renderer = RecordingRenderer::default();
        let mut vp = Viewport::default();
        vp.show(&mut page).unwrap();
        vp.frame(&mut renderer);
        vp.exit_scene(&mut page).unwrap();
        vp.frame(&mut renderer);

        assert_eq!(renderer.frames.len(), 2);
        assert!(renderer.frames[0].visible);
        assert!(!renderer.frames[1].visible);
    }

    #[test]
    fn show_without_container_fails() {
        let mut page = FakePage::default();
        let mut vp = Viewport::default();
        let err = vp.show(&mut page).unwrap_err();
        assert!(matches!(err, SceneError::MissingElement(ref id) if id == "scene-container"));
    }

    #[test]
    fn frame_draws_loaded_bodies() {
        let mut vp = Viewport::default();
        let mut renderer = RecordingRenderer::default();
        let requests = vp.start_loads(&vp.default_manifest());
        assert_eq!(requests.len(), BodyId::COUNT);

        for req in requests.iter().filter(|r| r.body != BodyId::Moon) {
            vp.complete_load(req.ticket, &triangle_glb());
        }
        vp.frame(&mut renderer);

        let frame = renderer.last().unwrap();
        assert_eq!(frame.instances.len(), BodyId::COUNT - 1);
        assert_eq!(frame.lights.len(), 2);
        assert_eq!(frame.world_generation, (BodyId::COUNT - 1) as u32);
        assert_eq!(vp.loader().pending_count(), 1);
    }

    #[test]
    fn frame_after_focus_renders_exact_eye() {
        let mut vp = Viewport::default();
        let mut renderer = RecordingRenderer::default();
        vp.focus_on_planet("saturn");
        vp.frame(&mut renderer);
        assert_eq!(renderer.last().unwrap().camera.eye, [8590.0, 3.0, 10.0, 1.0]);
    }

    #[test]
    fn queued_input_moves_camera_on_next_frame() {
        let mut vp = Viewport::default();
        let mut renderer = RecordingRenderer::default();
        vp.focus_on_planet("jupiter");
        let before = vp.camera_state();

        vp.push_input(InputEvent::PointerDown { button: PointerButton::Primary, x: 100.0, y: 100.0 });
        vp.push_input(InputEvent::PointerMove { x: 160.0, y: 100.0 });
        vp.push_input(InputEvent::PointerUp { button: PointerButton::Primary, x: 160.0, y: 100.0 });
        assert_eq!(vp.camera_state(), before);

        vp.frame(&mut renderer);
        let after = vp.camera_state();
        assert_ne!(after.eye, before.eye);
        assert_eq!(after.target, before.target);
    }

    #[test]
    fn resize_updates_camera_and_renderer() {
        let mut vp = Viewport::default();
        let mut renderer = RecordingRenderer::default();
        vp.resize(1000, 500, &mut renderer);
        vp.frame(&mut renderer);

        assert_eq!(renderer.resizes, vec![(1000, 500)]);
        assert_eq!(vp.size(), (1000, 500));
        assert_eq!(renderer.last().unwrap().viewport, (1000, 500));
    }
}
