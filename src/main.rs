use std::sync::Arc;
use std::time::Instant;

use winit::{
    event::*,
    event_loop::EventLoop,
    window::Window,
};

// Import from the library crate
use foxsphere::{
    assets, logging, ui,
    config::DemoConfig,
    controller::{FrameLoop, FrameStats, InputEvent, InputState, MouseButton, OrbitControls, ResizeRequest, Viewport},
    error::AppError,
    model::SceneState,
    view::{GpuContext, RenderState},
};

struct App {
    window: Arc<Window>,
    render_state: RenderState,
    frame_loop: FrameLoop,
    input_state: InputState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Frame timing
    start_time: Instant,
    last_stats: FrameStats,
}

impl App {
    async fn new(window: Arc<Window>, config: DemoConfig) -> Result<Self, AppError> {
        let size = window.inner_size();
        let scale = window.scale_factor();
        let logical = size.to_logical::<f64>(scale);
        let viewport = Viewport::new(logical.width as u32, logical.height as u32, scale, config.max_pixel_ratio);
        let physical = viewport.physical_size();

        // Initialize wgpu
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| AppError::Gpu(format!("failed to create surface: {e}")))?;
        let gpu = GpuContext::new_native(&instance, surface, physical.width, physical.height).await?;

        // Missing floor textures are fatal, the fox is optional
        let textures = assets::load_grass_textures(&config).await?;
        let render_state = RenderState::new(gpu, &config.floor, &textures);

        let scene = SceneState::new(&config, viewport.width, viewport.height);
        let controls = OrbitControls::new(&config.controls, config.camera.target);
        let pending_model = assets::spawn_model_load(&config);
        let frame_loop = FrameLoop::new(scene, controls, viewport, Some(pending_model));

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            render_state,
            frame_loop,
            input_state: InputState::new(),
            egui_state,
            egui_ctx,
            start_time: Instant::now(),
            last_stats: FrameStats::default(),
        })
    }

    fn input(&mut self, event: &WindowEvent) {
        // egui sees every event; the panel hover flag keeps it from orbiting
        let _ = self.egui_state.on_window_event(self.window.as_ref(), event);

        let scale = self.window.scale_factor();
        let translated = match event {
            WindowEvent::CursorMoved { position, .. } => {
                let p = position.to_logical::<f32>(scale);
                Some(InputEvent::PointerMove { x: p.x, y: p.y })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => MouseButton::Left,
                };
                match state {
                    ElementState::Pressed => {
                        let (x, y) = self.input_state.pointer_pos.unwrap_or((0.0, 0.0));
                        Some(InputEvent::PointerDown { button, x, y })
                    }
                    ElementState::Released => Some(InputEvent::PointerUp { button }),
                }
            }
            // winit reports scrolling away from the user as positive
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                Some(InputEvent::Wheel { delta_y })
            }
            WindowEvent::Resized(size) => {
                let logical = size.to_logical::<f64>(scale);
                Some(InputEvent::Resized(ResizeRequest {
                    width: logical.width as u32,
                    height: logical.height as u32,
                    device_pixel_ratio: scale,
                }))
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        };

        if let Some(event) = translated {
            self.input_state.process_event(&event);
        }
    }

    fn render_ui(&mut self) {
        // Same capped ratio the surface is sized with
        let dpr = self.frame_loop.viewport.pixel_ratio as f32;
        let raw_input = self.egui_state.take_egui_input(&self.window);
        ui::apply_pixel_ratio(&self.egui_ctx, &raw_input, dpr);
        let info = ui::PanelInfo::collect(&self.frame_loop, &self.last_stats);
        let ui_output = ui::build_ui(&self.egui_ctx, raw_input, &mut self.frame_loop.scene.playback, &info);
        self.input_state.ui_wants_pointer = ui_output.wants_pointer;

        let full_output = ui_output.full_output;
        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);
        let primitives = self.egui_ctx.tessellate(full_output.shapes, dpr);
        self.render_state.set_ui(primitives, full_output.textures_delta, dpr);
    }

    fn update(&mut self) -> Result<(), foxsphere::error::RenderError> {
        self.render_ui();
        let now = self.start_time.elapsed().as_secs_f64();
        let input = self.input_state.consume();
        self.last_stats = self.frame_loop.tick(now, &input, &mut self.render_state)?;
        Ok(())
    }
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = DemoConfig::default();
    tracing::info!("asset root: {}", config.asset_root);

    let event_loop = EventLoop::new().map_err(|e| AppError::Page(e.to_string()))?;
    let window_attributes = Window::default_attributes()
        .with_title("foxsphere")
        .with_inner_size(winit::dpi::LogicalSize::new(config.initial_width, config.initial_height));
    #[allow(deprecated)]
    let window = event_loop
        .create_window(window_attributes)
        .map_err(|e| AppError::Page(e.to_string()))?;
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window.clone(), config))?;

    #[allow(deprecated)]
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
                app.input(event);
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::RedrawRequested => {
                        if let Err(e) = app.update() {
                            tracing::error!("render failed, exiting: {}", e);
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| AppError::Page(e.to_string()))
}
