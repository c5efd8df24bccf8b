use anyhow::{Context, Result};
use cabinview_common::ViewerConfig;
use cabinview_input::{Action, InputState, Key, KeyState};
use cabinview_render::{Camera, MouseLook};
use cabinview_render_wgpu::{GpuMesh, WgpuRenderer};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "cabinview-desktop", about = "Walk or fly around a textured cabin scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with the free (flying) camera
    #[arg(long, conflicts_with = "constrained")]
    free_camera: bool,

    /// Start with the ground-locked camera
    #[arg(long)]
    constrained: bool,

    /// Start in wireframe mode
    #[arg(long)]
    wireframe: bool,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ViewerConfig) {
        if self.free_camera {
            config.camera.free_camera = true;
        }
        if self.constrained {
            config.camera.free_camera = false;
        }
        if self.wireframe {
            config.scene.wireframe = true;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyC => Key::C,
        KeyCode::F1 => Key::F1,
        KeyCode::Escape => Key::Escape,
        KeyCode::ControlLeft => Key::LeftCtrl,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft => Key::LeftShift,
        _ => return None,
    })
}

/// Bound key and phase of a keyboard event, if it is one.
fn key_input(event: &WindowEvent) -> Option<(Key, KeyState)> {
    let WindowEvent::KeyboardInput {
        event:
            KeyEvent {
                physical_key: PhysicalKey::Code(code),
                state,
                repeat,
                ..
            },
        ..
    } = event
    else {
        return None;
    };
    let state = match (*state, *repeat) {
        (ElementState::Released, _) => KeyState::Released,
        (ElementState::Pressed, true) => KeyState::Repeated,
        (ElementState::Pressed, false) => KeyState::Pressed,
    };
    Some((map_key(*code)?, state))
}

/// Viewer state that does not touch the GPU.
struct AppState {
    camera: Camera,
    look: MouseLook,
    input: InputState,
    sprint_multiplier: f32,
    wireframe: bool,
    show_hud: bool,
    cursor_grabbed: bool,
    quit: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: &ViewerConfig) -> Self {
        let camera = Camera::from_config(&config.camera);
        Self {
            look: MouseLook::looking_along(camera.front(), config.camera.pitch_limit_degrees),
            camera,
            input: InputState::new(config.input.movement),
            sprint_multiplier: config.camera.sprint_multiplier,
            wireframe: config.scene.wireframe,
            show_hud: true,
            cursor_grabbed: config.input.grab_cursor,
            quit: false,
            last_frame: Instant::now(),
        }
    }

    /// A key event egui used. Releases still reach the input state so a
    /// key held before the HUD took focus does not stay down.
    fn key_consumed_by_hud(&mut self, key: Key, state: KeyState) {
        if state == KeyState::Released {
            self.input.key_event(key, state);
        }
    }

    /// Apply one frame of input to the camera and viewer flags.
    fn update(&mut self, dt: f32) {
        let frame = self.input.take_frame();

        let dt_move = if frame.sprint {
            dt * self.sprint_multiplier
        } else {
            dt
        };
        if frame.moves.front {
            self.camera.move_front(dt_move);
        }
        if frame.moves.back {
            self.camera.move_back(dt_move);
        }
        if frame.moves.left {
            self.camera.move_left(dt_move);
        }
        if frame.moves.right {
            self.camera.move_right(dt_move);
        }
        if frame.moves.up {
            self.camera.move_up(dt_move);
        }
        if frame.moves.down {
            self.camera.move_down(dt_move);
        }

        if self.cursor_grabbed && frame.mouse_delta != glam::Vec2::ZERO {
            let scale = self.camera.sensitivity() * dt;
            let front = self
                .look
                .apply(frame.mouse_delta.x, frame.mouse_delta.y, scale);
            self.camera.set_front(front);
        }

        for action in frame.actions {
            match action {
                Action::Quit => self.quit = true,
                Action::ToggleWireframe => self.wireframe = !self.wireframe,
                Action::ToggleCameraMode => {
                    let free = !self.camera.is_free();
                    self.camera.set_camera_mode(free);
                    tracing::info!("camera mode: {}", if free { "free" } else { "ground" });
                }
                Action::ToggleHud => self.show_hud = !self.show_hud,
                Action::ReleaseCursor => self.cursor_grabbed = false,
                Action::Move(_) | Action::Sprint => {}
            }
        }
    }

    fn draw_hud(&mut self, ctx: &EguiContext, meshes: &mut [GpuMesh], can_wireframe: bool) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("Camera")
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                let p = self.camera.pos();
                ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                ui.label(format!(
                    "Yaw: {:.1}  Pitch: {:.1}",
                    self.look.yaw, self.look.pitch
                ));
                ui.separator();

                let mut free = self.camera.is_free();
                if ui.checkbox(&mut free, "Free camera (C)").changed() {
                    self.camera.set_camera_mode(free);
                }
                let mut speed = self.camera.speed();
                if ui
                    .add(egui::Slider::new(&mut speed, 0.5..=20.0).text("Speed"))
                    .changed()
                {
                    self.camera.set_speed(speed);
                }
                let mut sensitivity = self.camera.sensitivity();
                if ui
                    .add(egui::Slider::new(&mut sensitivity, 0.1..=10.0).text("Sensitivity"))
                    .changed()
                {
                    self.camera.set_sensitivity(sensitivity);
                }
                ui.add_enabled(
                    can_wireframe,
                    egui::Checkbox::new(&mut self.wireframe, "Wireframe (P)"),
                );

                ui.separator();
                let vertex_count: usize = meshes.iter().map(GpuMesh::vertex_count).sum();
                ui.label(format!("Vertices: {vertex_count}"));
                for mesh in meshes.iter_mut() {
                    let current = mesh.transform.scale.to_array();
                    let mut scale = current;
                    ui.horizontal(|ui| {
                        ui.label(mesh.name.as_str());
                        for (axis, value) in ["X: ", "Y: ", "Z: "].into_iter().zip(&mut scale) {
                            ui.add(egui::DragValue::new(value).prefix(axis).speed(0.01));
                        }
                    });
                    if scale != current {
                        mesh.scale(scale[0], scale[1], scale[2]);
                    }
                }
                ui.small("WASD: Move | Ctrl: Sprint | Esc: Release | Q: Quit");
            });
    }
}

fn set_cursor_grab(window: &Window, grab: bool) {
    if grab {
        let result = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
        if let Err(e) = result {
            tracing::warn!("cursor grab failed: {e}");
        }
    } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        tracing::warn!("cursor release failed: {e}");
    }
    window.set_cursor_visible(!grab);
}

/// Window and GPU resources, created on the first `resumed`.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    cursor_grabbed: bool,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, viewer: &ViewerConfig, ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(viewer.window.title.clone())
            .with_inner_size(PhysicalSize::new(viewer.window.width, viewer.window.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cabinview_device"),
                required_features: adapter.features() & wgpu::Features::POLYGON_MODE_LINE,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("wgpu error: {err}");
        }));

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if viewer.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);
        let scene = cabinview_assets::load_scene(&viewer.scene);
        renderer.set_scene(&device, &queue, &scene);

        let egui_winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend ({})",
            adapter.get_info().backend.to_str(),
            adapter.get_info().name
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
            cursor_grabbed: false,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Bring the cursor and pipeline in line with the viewer flags.
    fn sync(&mut self, state: &mut AppState) {
        if self.cursor_grabbed != state.cursor_grabbed {
            set_cursor_grab(&self.window, state.cursor_grabbed);
            self.cursor_grabbed = state.cursor_grabbed;
        }
        if self.renderer.is_wireframe() != state.wireframe {
            state.wireframe = self.renderer.set_wireframe(state.wireframe);
        }
    }
}

struct GpuApp {
    viewer: ViewerConfig,
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(viewer: ViewerConfig) -> Self {
        Self {
            state: AppState::new(&viewer),
            viewer,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        if self.state.quit {
            tracing::info!("quit requested");
            event_loop.exit();
            return;
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.sync(&mut self.state);
        self.state.camera.update_uniforms(&mut gpu.renderer);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            self.viewer.scene.clear_color,
        );

        let can_wireframe = gpu.renderer.supports_wireframe();
        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let meshes = gpu.renderer.meshes_mut();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_hud(ctx, meshes, can_wireframe);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.viewer, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.camera.set_aspect_ratio(gpu.aspect_ratio());
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                if let Some((key, state)) = key_input(&event) {
                    self.state.key_consumed_by_hud(key, state);
                }
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state.camera.set_aspect_ratio(gpu.aspect_ratio());
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear_held();
            }
            WindowEvent::KeyboardInput { .. } => {
                if let Some((key, state)) = key_input(&event) {
                    self.state.input.key_event(key, state);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.state.cursor_grabbed = true;
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.cursor_grabbed {
                self.state
                    .input
                    .mouse_motion(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("cabinview-desktop starting");

    let mut viewer = ViewerConfig::load_or_default(cli.config.as_deref())
        .context("failed to load viewer config")?;
    cli.apply_overrides(&mut viewer);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(viewer);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn state() -> AppState {
        AppState::new(&ViewerConfig::default())
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "cabinview-desktop",
            "--constrained",
            "--wireframe",
            "--width",
            "640",
        ]);
        let mut config = ViewerConfig::default();
        cli.apply_overrides(&mut config);
        assert!(!config.camera.free_camera);
        assert!(config.scene.wireframe);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 1000);
    }

    #[test]
    fn camera_mode_flags_conflict() {
        assert!(
            Cli::try_parse_from(["cabinview-desktop", "--free-camera", "--constrained"]).is_err()
        );
    }

    #[test]
    fn held_key_moves_camera_forward() {
        let mut s = state();
        let start = s.camera.pos();
        s.input.key_event(Key::W, KeyState::Pressed);
        s.update(0.1);
        s.update(0.1);
        let moved = s.camera.pos() - start;
        let expected = s.camera.front() * s.camera.speed() * 0.2;
        assert!((moved - expected).length() < 1e-4);
    }

    #[test]
    fn sprint_scales_motion() {
        let mut walk = state();
        let mut run = state();
        walk.input.key_event(Key::W, KeyState::Pressed);
        run.input.key_event(Key::W, KeyState::Pressed);
        run.input.key_event(Key::LeftCtrl, KeyState::Pressed);
        let start = walk.camera.pos();
        walk.update(0.1);
        run.update(0.1);
        let walked = (walk.camera.pos() - start).length();
        let ran = (run.camera.pos() - start).length();
        assert!((ran - 2.0 * walked).abs() < 1e-4);
    }

    #[test]
    fn mouse_is_ignored_until_grabbed() {
        let mut s = state();
        s.cursor_grabbed = false;
        let front = s.camera.front();
        s.input.mouse_motion(50.0, 0.0);
        s.update(0.1);
        assert_eq!(s.camera.front(), front);

        s.cursor_grabbed = true;
        s.input.mouse_motion(50.0, 0.0);
        s.update(0.1);
        assert_ne!(s.camera.front(), front);
        assert!((s.camera.front().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn toggles_and_quit() {
        let mut s = state();
        assert!(s.camera.is_free());
        for key in [Key::C, Key::P, Key::F1] {
            s.input.key_event(key, KeyState::Pressed);
        }
        s.update(0.016);
        assert!(!s.camera.is_free());
        assert!(s.wireframe);
        assert!(!s.show_hud);
        assert!(!s.quit);

        s.input.key_event(Key::Q, KeyState::Pressed);
        s.update(0.016);
        assert!(s.quit);
    }

    #[test]
    fn hud_focus_does_not_leave_keys_held() {
        let mut s = state();
        s.input.key_event(Key::W, KeyState::Pressed);
        s.update(0.1);
        s.key_consumed_by_hud(Key::W, KeyState::Released);
        s.key_consumed_by_hud(Key::S, KeyState::Pressed);
        s.update(0.1);
        let before = s.camera.pos();
        s.update(0.1);
        assert_eq!(s.camera.pos(), before);
    }

    #[test]
    fn cursor_starts_grabbed() {
        assert!(state().cursor_grabbed);
    }

    #[test]
    fn space_and_shift_change_height_in_free_mode() {
        let mut s = state();
        let start = s.camera.pos();
        s.input.key_event(Key::Space, KeyState::Pressed);
        s.update(0.1);
        assert!(s.camera.pos().y > start.y);

        s.input.key_event(Key::Space, KeyState::Released);
        s.input.key_event(Key::C, KeyState::Pressed);
        s.update(0.1);
        let ground = s.camera.pos();
        s.input.key_event(Key::LeftShift, KeyState::Pressed);
        s.update(0.1);
        assert_eq!(s.camera.pos(), ground);
    }

    #[test]
    fn escape_releases_cursor() {
        let mut s = state();
        s.cursor_grabbed = true;
        s.input.key_event(Key::Escape, KeyState::Pressed);
        s.update(0.016);
        assert!(!s.cursor_grabbed);
    }

    #[test]
    fn position_stays_in_bounds() {
        let mut s = state();
        s.camera.set_speed(1000.0);
        s.input.key_event(Key::W, KeyState::Pressed);
        s.update(0.1);
        s.camera.update();
        let p = s.camera.pos();
        assert!(s.camera.bounds().contains(p));
        assert_ne!(p, Vec3::new(0.0, 5.0, 10.0));
    }

    #[test]
    fn known_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::KeyW), Some(Key::W));
        assert_eq!(map_key(KeyCode::ControlLeft), Some(Key::LeftCtrl));
        assert_eq!(map_key(KeyCode::Space), Some(Key::Space));
        assert_eq!(map_key(KeyCode::ShiftLeft), Some(Key::LeftShift));
        assert_eq!(map_key(KeyCode::KeyZ), None);
    }
}
