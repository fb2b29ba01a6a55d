mod gamepad;

use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use gilrs::Gilrs;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use terrainview_camera::{CameraFrame, Projection};
use terrainview_input::{
    ControlConfig, FlightControl, HeldControls, InputSample, RelativeCursor, map_input,
};
use terrainview_mesh::{GridMesh, MeshError};
use terrainview_render_wgpu::{
    FrameParams, GpuError, GraphicsContext, OUTPUT_NAME, SceneUniforms, ShaderError, ShaderProgram,
    ShaderSources, TerrainRenderer,
};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

const WINDOW_WIDTH: u32 = 640;
const WINDOW_HEIGHT: u32 = 480;

#[derive(Parser)]
#[command(name = "terrainview", about = "Fly over procedural terrain and water")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grid vertices along X
    #[arg(long, default_value_t = 1500)]
    grid_width: u32,

    /// Grid vertices along Z
    #[arg(long, default_value_t = 1500)]
    grid_height: u32,

    /// Directory holding terrain.vert.wgsl and terrain.frag.wgsl
    #[arg(long, default_value = "shaders")]
    shader_dir: PathBuf,

    /// Start fullscreen
    #[arg(long)]
    fullscreen: bool,
}

/// Flight and input state. Survives window recreation.
struct AppState {
    camera: CameraFrame,
    projection: Projection,
    controls: ControlConfig,
    held: HeldControls,
    cursor: RelativeCursor,
    gamepads: Option<Gilrs>,
    mesh: GridMesh,
    shader_dir: PathBuf,
    focused: bool,
    debug: bool,
    show_hud: bool,
    last_shader_error: Option<String>,
    start: Instant,
    last_frame: Instant,
    frame_ms: f32,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self, MeshError> {
        let mesh = GridMesh::build(cli.grid_width, cli.grid_height)?;
        let now = Instant::now();
        Ok(Self {
            camera: CameraFrame::default(),
            projection: Projection::default(),
            controls: ControlConfig::default(),
            held: HeldControls::new(),
            cursor: RelativeCursor::new(Vec2::ZERO),
            gamepads: gamepad::open(),
            mesh,
            shader_dir: cli.shader_dir.clone(),
            focused: true,
            debug: false,
            show_hud: true,
            last_shader_error: None,
            start: now,
            last_frame: now,
            frame_ms: 0.0,
        })
    }

    /// Fog reaches full strength at half the smaller grid extent.
    fn view_distance(&self) -> f32 {
        self.mesh.width().min(self.mesh.height()) as f32 / 2.0
    }

    /// Sample every input device and step the camera once.
    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_ms = self.frame_ms * 0.9 + dt * 1000.0 * 0.1;

        let cursor_offset = if self.focused {
            self.cursor.take_offset()
        } else {
            Vec2::ZERO
        };
        let sample = InputSample {
            cursor_offset,
            held: self.held.clone(),
            gamepad: self.gamepads.as_mut().and_then(gamepad::sample),
        };
        let delta = map_input(&sample, &self.controls);
        self.camera.advance(&delta);
    }

    fn frame_params(&self) -> FrameParams {
        FrameParams {
            projection: self.projection.matrix(),
            model_view: self.camera.view_matrix(),
            time: self.start.elapsed().as_secs_f32(),
            player_position: self.camera.position,
        }
    }

    fn draw_hud(&self, ctx: &EguiContext, backend: &str) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("terrainview")
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                let fps = if self.frame_ms > 0.0 {
                    1000.0 / self.frame_ms
                } else {
                    0.0
                };
                ui.label(format!("{fps:.0} fps ({:.2} ms) on {backend}", self.frame_ms));
                ui.label(format!(
                    "grid {}x{}, {} indices",
                    self.mesh.width(),
                    self.mesh.height(),
                    self.mesh.index_count()
                ));

                ui.separator();
                let p = self.camera.position;
                ui.label(format!("position ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!("speed {:.2}", self.camera.speed));
                if self.debug {
                    ui.label("debug shading on");
                }
                if let Some(error) = &self.last_shader_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }

                ui.separator();
                ui.small("W/S pitch | Q/E yaw | A/D roll | Shift/Ctrl speed");
                ui.small("Space reload shaders | R rebuild grid | Tab fullscreen | F3 debug | F1 HUD");
            });
    }
}

fn flight_control(key: KeyCode) -> Option<FlightControl> {
    Some(match key {
        KeyCode::KeyW => FlightControl::PitchDown,
        KeyCode::KeyS => FlightControl::PitchUp,
        KeyCode::KeyQ => FlightControl::YawLeft,
        KeyCode::KeyE => FlightControl::YawRight,
        KeyCode::KeyA => FlightControl::RollLeft,
        KeyCode::KeyD => FlightControl::RollRight,
        KeyCode::ShiftLeft => FlightControl::Accelerate,
        KeyCode::ControlLeft => FlightControl::Decelerate,
        _ => return None,
    })
}

fn load_program(
    context: &GraphicsContext,
    shader_dir: &std::path::Path,
) -> Result<ShaderProgram, ShaderError> {
    let sources = ShaderSources::load_terrain(shader_dir)?;
    ShaderProgram::compile_and_link(&context.device, context.format(), &sources, OUTPUT_NAME)
}

/// Everything tied to one window. Dropped and rebuilt as a unit.
struct Graphics {
    renderer: TerrainRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    context: GraphicsContext,
    window: Arc<Window>,
}

impl Graphics {
    fn create(
        event_loop: &ActiveEventLoop,
        state: &AppState,
        egui_ctx: &EguiContext,
        fullscreen: bool,
    ) -> Result<Self> {
        let mut attrs = Window::default_attributes().with_title("terrainview");
        attrs = if fullscreen {
            attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
        } else {
            attrs.with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        };
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let context = GraphicsContext::new(window.clone(), size.width, size.height)?;
        let program = load_program(&context, &state.shader_dir).map_err(GpuError::Shader)?;

        let mut renderer = TerrainRenderer::new(
            &context.device,
            program,
            SceneUniforms::default(),
            size.width,
            size.height,
        );
        renderer.set_environment(SceneUniforms::default().fog_color, state.view_distance());
        renderer.set_debug(state.debug);
        renderer.upload_mesh(&context.device, &state.mesh);

        grab_cursor(&window);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&context.device, context.format(), None, 1, false);

        Ok(Self {
            renderer,
            egui_winit,
            egui_renderer,
            context,
            window,
        })
    }

    fn center(&self) -> Vec2 {
        let (width, height) = self.context.size();
        Vec2::new(width as f32, height as f32) / 2.0
    }

    /// Move the real cursor back to `to`. Returns false when the platform
    /// refuses.
    fn warp_cursor(&self, to: Vec2) -> bool {
        let position = PhysicalPosition::new(f64::from(to.x), f64::from(to.y));
        match self.window.set_cursor_position(position) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("cursor warp unsupported: {e}");
                false
            }
        }
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        tracing::warn!("cursor grab failed: {e}");
    }
    window.set_cursor_visible(false);
}

struct App {
    state: AppState,
    graphics: Option<Graphics>,
    egui_ctx: EguiContext,
    fullscreen: bool,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(state: AppState, fullscreen: bool) -> Self {
        Self {
            state,
            graphics: None,
            egui_ctx: EguiContext::default(),
            fullscreen,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    /// Tear down the window and every GPU resource, then build them again.
    fn reinitialize(&mut self, event_loop: &ActiveEventLoop) {
        self.graphics = None;
        match Graphics::create(event_loop, &self.state, &self.egui_ctx, self.fullscreen) {
            Ok(graphics) => {
                let (width, height) = graphics.context.size();
                self.state.projection.resize(width, height);
                self.state.cursor.recenter(graphics.center());
                if self.state.cursor.needs_warp() {
                    graphics.warp_cursor(graphics.center());
                }
                graphics.window.request_redraw();
                self.graphics = Some(graphics);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    /// A broken edit keeps the running program.
    fn reload_shaders(&mut self) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        match load_program(&gfx.context, &self.state.shader_dir) {
            Ok(program) => {
                gfx.renderer.replace_program(&gfx.context.device, program);
                self.state.last_shader_error = None;
                tracing::info!("shaders reloaded");
            }
            Err(e) => {
                tracing::error!("shader reload failed, keeping previous program: {e}");
                self.state.last_shader_error = Some(e.to_string());
            }
        }
    }

    fn rebuild_mesh(&mut self) -> Result<(), MeshError> {
        self.state.mesh = GridMesh::build(self.state.mesh.width(), self.state.mesh.height())?;
        if let Some(gfx) = self.graphics.as_mut() {
            gfx.renderer.upload_mesh(&gfx.context.device, &self.state.mesh);
        }
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, pressed: bool, repeat: bool) {
        if let Some(control) = flight_control(key) {
            self.state.held.set(control, pressed);
            return;
        }

        if !pressed || repeat {
            return;
        }

        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => self.reload_shaders(),
            KeyCode::KeyR => {
                if let Err(e) = self.rebuild_mesh() {
                    self.fail(event_loop, e.into());
                }
            }
            KeyCode::Tab => {
                self.fullscreen = !self.fullscreen;
                tracing::info!(fullscreen = self.fullscreen, "recreating window");
                self.reinitialize(event_loop);
            }
            KeyCode::F3 => {
                self.state.debug = !self.state.debug;
                if let Some(gfx) = self.graphics.as_mut() {
                    gfx.renderer.set_debug(self.state.debug);
                }
            }
            KeyCode::F1 => self.state.show_hud = !self.state.show_hud,
            _ => {}
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        // Without raw device motion the cursor is pinned by warping it back.
        if self.state.focused
            && self.state.cursor.needs_warp()
            && !gfx.warp_cursor(self.state.cursor.reference())
        {
            self.state.cursor.anchor_to_last_seen();
        }

        let Some(output) = gfx.context.acquire() else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let device = &gfx.context.device;
        let queue = &gfx.context.queue;
        gfx.renderer
            .render(device, queue, &view, &self.state.frame_params());

        let backend = gfx.context.backend().to_str();
        let raw_input = gfx.egui_winit.take_egui_input(&gfx.window);
        let state = &self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_hud(ctx, backend);
        });
        gfx.egui_winit
            .handle_platform_output(&gfx.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = gfx.context.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let egui_renderer = &mut gfx.egui_renderer;
        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        gfx.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_none() && self.fatal.is_none() {
            self.reinitialize(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };
        // Events from a window torn down by a fullscreen toggle.
        if gfx.window.id() != window_id {
            return;
        }
        let response = gfx.egui_winit.on_window_event(&gfx.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => {
                gfx.context.resize(new_size.width, new_size.height);
                let (width, height) = gfx.context.size();
                gfx.renderer.resize(&gfx.context.device, width, height);
                self.state.projection.resize(width, height);
                self.state.cursor.recenter(gfx.center());
            }
            WindowEvent::Focused(focused) => {
                self.state.focused = focused;
                if focused {
                    grab_cursor(&gfx.window);
                    self.state.cursor.recenter(gfx.center());
                } else {
                    self.state.held.clear();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .cursor
                    .moved_to(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, key, key_state == ElementState::Pressed, repeat);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.focused && self.graphics.is_some() {
                self.state
                    .cursor
                    .moved_by(Vec2::new(delta.0 as f32, delta.1 as f32));
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.graphics {
            gfx.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("terrainview starting");

    let state = AppState::new(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(state, cli.fullscreen);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
