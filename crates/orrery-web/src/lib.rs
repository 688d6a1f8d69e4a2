//! Browser bridge for the orrery.
//!
//! Exports `initSolarSystem`, `focusOnPlanet`, `exitScene`, `loadManifest`
//! and `cancelLoads` to JS, keeps the [`SceneRunner`] in a thread-local, fetches models with
//! `fetch`, and drives the render loop from `requestAnimationFrame`. After
//! every frame an `orrery:frame` event fires on the scene container; the JS
//! renderer then reads the frame buffer through `frame_ptr`/`frame_len`.

pub mod dom;
pub mod fetch;
pub mod host;
pub mod runner;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::thread::LocalKey;

use orrery_engine::{InputEvent, LoadEvent, LoadRequest, LoadTicket, PointerButton, SceneError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AbortController, CustomEvent, CustomEventInit, HtmlElement, PointerEvent, WheelEvent};

pub use dom::DomSurface;
pub use host::HostRenderer;
pub use runner::SceneRunner;

pub const FRAME_EVENT: &str = "orrery:frame";
pub const LOAD_EVENT: &str = "orrery:load";

thread_local! {
    static RUNNER: RefCell<Option<SceneRunner>> = RefCell::new(None);
    static LISTENING: Cell<bool> = Cell::new(false);
    static LOOP_RUNNING: Cell<bool> = Cell::new(false);
    static FETCHES: RefCell<HashMap<LoadTicket, AbortController>> = RefCell::new(HashMap::new());
}

/// Borrow the runner for one callback, creating it on first use.
fn with_runner<R>(f: impl FnOnce(&mut SceneRunner) -> R) -> R {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let runner = borrow.get_or_insert_with(SceneRunner::default);
        f(runner)
    })
}

fn to_js(e: SceneError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Run `setup` unless it already succeeded. A failed setup is retried on the next call.
fn once<E>(done: &'static LocalKey<Cell<bool>>, setup: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
    if done.with(Cell::get) {
        return Ok(());
    }
    setup()?;
    done.with(|c| c.set(true));
    Ok(())
}

/// Show the scene, start loading every model and start the render loop.
#[wasm_bindgen(js_name = initSolarSystem)]
pub fn init_solar_system() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let mut surface = DomSurface::current().map_err(to_js)?;
    let container_id = with_runner(|r| r.viewport().config().container_id.clone());
    let container = surface.element(&container_id).map_err(to_js)?;

    let requests = with_runner(|r| r.start(&mut surface)).map_err(to_js)?;
    fit_to(&container);

    if !LOOP_RUNNING.with(Cell::get) {
        once(&LISTENING, || install_listeners(&container))?;
        once(&LOOP_RUNNING, || start_render_loop(container))?;
        log::info!("orrery: initialized");
    }

    for request in requests {
        spawn_load(request);
    }
    Ok(())
}

/// Fly the camera to a named body. Unknown names are ignored.
#[wasm_bindgen(js_name = focusOnPlanet)]
pub fn focus_on_planet(name: &str) {
    with_runner(|r| r.focus_on_planet(name));
}

/// Hide the scene and show the main page again.
#[wasm_bindgen(js_name = exitScene)]
pub fn exit_scene() -> Result<(), JsValue> {
    let mut surface = DomSurface::current().map_err(to_js)?;
    with_runner(|r| r.exit_scene(&mut surface)).map_err(to_js)
}

/// Replace the default model manifest. Call before `initSolarSystem`.
#[wasm_bindgen(js_name = loadManifest)]
pub fn load_manifest(json: &str) -> Result<(), JsValue> {
    with_runner(|r| r.load_manifest(json)).map_err(to_js)
}

/// Cancel every model still loading and abort its request.
/// Returns how many loads were cancelled.
#[wasm_bindgen(js_name = cancelLoads)]
pub fn cancel_loads() -> u32 {
    let cancelled = with_runner(|r| r.cancel_loads());
    let controllers: Vec<AbortController> = FETCHES.with(|f| f.borrow_mut().drain().map(|(_, c)| c).collect());
    // Aborted fetches report failure later; the engine ignores them.
    for controller in controllers {
        controller.abort();
    }
    cancelled as u32
}

// ---- Frame buffer accessors ----

#[wasm_bindgen]
pub fn frame_ptr() -> *const f32 {
    with_runner(|r| r.frame_ptr())
}

#[wasm_bindgen]
pub fn frame_len() -> u32 {
    with_runner(|r| r.frame_len())
}

#[wasm_bindgen]
pub fn world_generation() -> u32 {
    with_runner(|r| r.world_generation())
}

// ---- Geometry accessors ----

#[wasm_bindgen]
pub fn node_count() -> u32 {
    with_runner(|r| r.node_count())
}

#[wasm_bindgen]
pub fn node_body(node: u32) -> i32 {
    with_runner(|r| r.node_body(node))
}

#[wasm_bindgen]
pub fn mesh_count(node: u32) -> u32 {
    with_runner(|r| r.mesh_count(node))
}

#[wasm_bindgen]
pub fn mesh_positions(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_positions(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_normals(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_normals(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_indices(node: u32, mesh: u32) -> Vec<u32> {
    with_runner(|r| r.mesh_indices(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_transform(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_transform(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_uvs(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_uvs(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_base_color(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_base_color(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_texture(node: u32, mesh: u32) -> Vec<u8> {
    with_runner(|r| r.mesh_texture(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_texture_mime(node: u32, mesh: u32) -> Option<String> {
    with_runner(|r| r.mesh_texture_mime(node, mesh))
}

#[wasm_bindgen]
pub fn mesh_bounds(node: u32, mesh: u32) -> Vec<f32> {
    with_runner(|r| r.mesh_bounds(node, mesh))
}

// ---- Internals ----

fn fit_to(container: &HtmlElement) {
    let width = container.client_width().max(1) as u32;
    let height = container.client_height().max(1) as u32;
    with_runner(|r| r.resize(width, height));
}

fn spawn_load(request: LoadRequest) {
    let ticket = request.ticket;
    let controller = match AbortController::new() {
        Ok(c) => Some(c),
        Err(e) => {
            log::warn!("no AbortController, {} cannot be aborted: {:?}", request.path, e);
            None
        }
    };
    let signal = controller.as_ref().map(AbortController::signal);
    if let Some(controller) = controller {
        FETCHES.with(|f| f.borrow_mut().insert(ticket, controller));
    }

    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch::fetch_bytes(&request.path, signal.as_ref(), |loaded, total| {
            with_runner(|r| r.load_progress(ticket, loaded, total));
        })
        .await;
        FETCHES.with(|f| f.borrow_mut().remove(&ticket));
        match result {
            Ok(bytes) => {
                with_runner(|r| r.complete_load(ticket, &bytes));
            }
            Err(e) => with_runner(|r| r.fail_load(ticket, e)),
        }
    });
}

fn listen<E: JsCast + 'static>(
    target: &HtmlElement,
    name: &str,
    mut handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    });
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn install_listeners(container: &HtmlElement) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resized = container.clone();
    let on_resize = Closure::<dyn FnMut()>::new(move || fit_to(&resized));
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    listen(container, "pointerdown", |e: PointerEvent| {
        if let Some(button) = PointerButton::from_dom(e.button()) {
            let (x, y) = (e.offset_x() as f32, e.offset_y() as f32);
            with_runner(|r| r.push_input(InputEvent::PointerDown { button, x, y }));
        }
    })?;
    listen(container, "pointerup", |e: PointerEvent| {
        if let Some(button) = PointerButton::from_dom(e.button()) {
            let (x, y) = (e.offset_x() as f32, e.offset_y() as f32);
            with_runner(|r| r.push_input(InputEvent::PointerUp { button, x, y }));
        }
    })?;
    listen(container, "pointermove", |e: PointerEvent| {
        let (x, y) = (e.offset_x() as f32, e.offset_y() as f32);
        with_runner(|r| r.push_input(InputEvent::PointerMove { x, y }));
    })?;
    listen(container, "wheel", |e: WheelEvent| {
        e.prevent_default();
        let delta_y = e.delta_y() as f32;
        with_runner(|r| r.push_input(InputEvent::Wheel { delta_y }));
    })?;
    listen(container, "contextmenu", |e: web_sys::Event| e.prevent_default())?;
    Ok(())
}

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Run the render loop forever, one cycle per animation frame.
fn start_render_loop(container: HtmlElement) -> Result<(), JsValue> {
    let next: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let first = next.clone();

    *first.borrow_mut() = Some(Closure::new(move || {
        let (generation, events) = with_runner(|r| {
            r.frame();
            (r.world_generation(), r.drain_load_events())
        });
        // Dispatch outside the borrow so listeners may call back in.
        for event in &events {
            dispatch(&container, LOAD_EVENT, &load_detail(event));
        }
        dispatch(&container, FRAME_EVENT, &JsValue::from(generation));

        if let Some(callback) = next.borrow().as_ref() {
            if let Err(e) = request_frame(callback) {
                log::error!("render loop stopped: {:?}", e);
            }
        }
    }));

    if let Some(callback) = first.borrow().as_ref() {
        request_frame(callback)?;
    }
    Ok(())
}

fn dispatch(target: &HtmlElement, name: &str, detail: &JsValue) {
    let init = CustomEventInit::new();
    init.set_detail(detail);
    match CustomEvent::new_with_event_init_dict(name, &init) {
        Ok(event) => {
            let _ = target.dispatch_event(&event);
        }
        Err(e) => log::warn!("could not create {} event: {:?}", name, e),
    }
}

fn load_detail(event: &LoadEvent) -> JsValue {
    let detail = js_sys::Object::new();
    let set = |key: &str, value: JsValue| {
        let _ = js_sys::Reflect::set(&detail, &JsValue::from_str(key), &value);
    };
    match event {
        LoadEvent::Progress { body, loaded, .. } => {
            set("kind", "progress".into());
            set("body", body.name().into());
            set("loaded", JsValue::from(*loaded as f64));
            if let Some(fraction) = event.fraction() {
                set("fraction", fraction.into());
            }
        }
        LoadEvent::Loaded { body, .. } => {
            set("kind", "loaded".into());
            set("body", body.name().into());
        }
        LoadEvent::Failed { body, reason, .. } => {
            set("kind", "failed".into());
            set("body", body.name().into());
            set("reason", reason.as_str().into());
        }
        LoadEvent::Cancelled { body, .. } => {
            set("kind", "cancelled".into());
            set("body", body.name().into());
        }
    }
    detail.into()
}
