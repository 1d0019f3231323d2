pub mod assets;
pub mod config;
pub mod error;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

#[cfg(target_arch = "wasm32")]
use crate::config::DemoConfig;
#[cfg(target_arch = "wasm32")]
use crate::controller::input::wasm as web_input;
#[cfg(target_arch = "wasm32")]
use crate::controller::{FrameLoop, FrameStats, InputEvent, InputState, OrbitControls, Viewport};
#[cfg(target_arch = "wasm32")]
use crate::error::AppError;
#[cfg(target_arch = "wasm32")]
use crate::model::SceneState;
#[cfg(target_arch = "wasm32")]
use crate::view::{GpuContext, RenderState};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await.map_err(|e| {
        tracing::error!("startup failed: {}", e);
        js_error(e.to_string())
    })
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), AppError> {
    let config = DemoConfig::default();

    let size = web_input::window_size(window);
    let viewport = Viewport::new(size.width, size.height, size.device_pixel_ratio, config.max_pixel_ratio);
    set_canvas_css_size(canvas, viewport.width, viewport.height);
    let physical = viewport.physical_size();

    let gpu = GpuContext::new(canvas, physical.width, physical.height).await?;

    // Missing floor textures are fatal, the fox is optional
    let textures = assets::load_grass_textures(&config).await?;
    let mut render_state = RenderState::new(gpu, &config.floor, &textures);
    drop(textures);

    let scene = SceneState::new(&config, viewport.width, viewport.height);
    let controls = OrbitControls::new(&config.controls, config.camera.target);
    let pending_model = assets::spawn_model_load(&config);
    let mut frame_loop = FrameLoop::new(scene, controls, viewport, Some(pending_model));

    let input_state = Rc::new(RefCell::new(InputState::new()));
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
    setup_input_listeners(document, window, canvas, input_state.clone(), egui_events.clone())
        .map_err(|e| AppError::Page(format!("{e:?}")))?;

    let egui_ctx = egui::Context::default();
    let performance = window.performance();
    let mut last_stats = FrameStats::default();

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), move || {
        let now = performance.as_ref().map(|p| p.now() / 1000.0).unwrap_or(0.0);

        // Debug panel first so a new selection applies to this frame
        let dpr = frame_loop.viewport.pixel_ratio as f32;
        let events: Vec<egui::Event> = egui_events.borrow_mut().drain(..).collect();
        let raw_input = ui::raw_input(
            frame_loop.viewport.width as f32,
            frame_loop.viewport.height as f32,
            now,
            events,
        );
        ui::apply_pixel_ratio(&egui_ctx, &raw_input, dpr);
        let info = ui::PanelInfo::collect(&frame_loop, &last_stats);
        let mut ui_output = ui::build_ui(&egui_ctx, raw_input, &mut frame_loop.scene.playback, &info);
        input_state.borrow_mut().ui_wants_pointer = ui_output.wants_pointer;

        let primitives = egui_ctx.tessellate(std::mem::take(&mut ui_output.full_output.shapes), dpr);
        render_state.set_ui(primitives, ui_output.full_output.textures_delta, dpr);

        let input = input_state.borrow_mut().consume();
        match frame_loop.tick(now, &input, &mut render_state) {
            Ok(stats) => {
                last_stats = stats;
                true
            }
            Err(e) => {
                tracing::error!("render failed, stopping the frame loop: {}", e);
                false
            }
        }
    });
    f.start();

    Ok(())
}

/// Pointer, wheel and window listeners feeding both the orbit controls and egui
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    input_state: Rc<RefCell<InputState>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> Result<(), JsValue> {
    // Mouse down on the canvas starts a drag
    {
        let input_state = input_state.clone();
        let egui_events = egui_events.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            input_state.borrow_mut().process_event(&web_input::mouse_down_to_input(&e));
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                button: pointer_button(e.button()),
                pressed: true,
                modifiers: egui::Modifiers::default(),
            });
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    // Mouse move and up on the window so drags continue outside the canvas
    {
        let input_state = input_state.clone();
        let egui_events = egui_events.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            input_state.borrow_mut().process_event(&web_input::mouse_move_to_input(&e));
            egui_events
                .borrow_mut()
                .push(egui::Event::PointerMoved(egui::pos2(e.client_x() as f32, e.client_y() as f32)));
        }) as Box<dyn FnMut(MouseEvent)>);
        window.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    {
        let input_state = input_state.clone();
        let egui_events = egui_events.clone();
        let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
            input_state.borrow_mut().process_event(&web_input::mouse_up_to_input(&e));
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                button: pointer_button(e.button()),
                pressed: false,
                modifiers: egui::Modifiers::default(),
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        window.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Mouse wheel dolly
    {
        let input_state = input_state.clone();
        let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
            input_state.borrow_mut().process_event(&web_input::wheel_to_input(&e));
            e.prevent_default();
        }) as Box<dyn FnMut(WheelEvent)>);
        canvas.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    // Window resize
    {
        let input_state = input_state.clone();
        let window_for_size = window.clone();
        let canvas = canvas.clone();
        let resize = Closure::wrap(Box::new(move |_e: Event| {
            let size = web_input::window_size(&window_for_size);
            set_canvas_css_size(&canvas, size.width, size.height);
            input_state.borrow_mut().process_event(&InputEvent::Resized(size));
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
        resize.forget();
    }

    // Losing focus ends any drag
    {
        let input_state = input_state.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().process_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Context menu prevention
    {
        let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
        contextmenu.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn pointer_button(button: i16) -> egui::PointerButton {
    match button {
        1 => egui::PointerButton::Middle,
        2 => egui::PointerButton::Secondary,
        _ => egui::PointerButton::Primary,
    }
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    body.set_attribute("style", "margin:0;overflow:hidden;background:#000")?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_class_name("webgl");
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

/// The drawing buffer is sized by the surface; CSS keeps the canvas at window size.
#[cfg(target_arch = "wasm32")]
fn set_canvas_css_size(canvas: &HtmlCanvasElement, width: u32, height: u32) {
    let style = format!("display:block;width:{width}px;height:{height}px");
    if let Err(e) = canvas.set_attribute("style", &style) {
        tracing::warn!("failed to size canvas: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// requestAnimationFrame loop. The callback returns `false` to stop rescheduling.
#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut() -> bool>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !inner.borrow_mut().as_mut()() {
                return;
            }

            // Recursively schedule next frame
            let cb_ref = callback_clone.borrow();
            if let Some(cb) = cb_ref.as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!("requestAnimationFrame failed: {:?}", e);
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                tracing::error!("requestAnimationFrame failed: {:?}", e);
            }
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
