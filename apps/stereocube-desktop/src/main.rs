use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stereocube_assets::Texture;
use stereocube_input::{Action, ActionInput, InputSource};
use stereocube_render::{FrameOrchestrator, LoopControl, RenderConfig, SceneAssets};
use stereocube_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Window pixels per eye-target pixel.
const WINDOW_SCALE: u32 = 2;

#[derive(Parser)]
#[command(name = "stereocube-desktop", about = "Stereoscopic spinning cube")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Render config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cube texture (PNG or JPEG). A checkerboard is used when omitted
    #[arg(short, long)]
    texture: Option<PathBuf>,
}

/// Keyboard stand-ins for the handheld controls.
fn key_action(key: KeyCode, pressed: bool) -> Action {
    match (key, pressed) {
        (KeyCode::ArrowUp, true) => Action::slider_up(),
        (KeyCode::ArrowDown, true) => Action::slider_down(),
        (KeyCode::Home, true) => Action::SetSlider(0.0),
        (KeyCode::End, true) => Action::SetSlider(1.0),
        (KeyCode::Enter, held) => Action::StartButton { held },
        _ => Action::Noop,
    }
}

struct StereoApp {
    config: RenderConfig,
    assets: SceneAssets,
    input: ActionInput,
    window: Option<Arc<Window>>,
    orchestrator: Option<FrameOrchestrator<WgpuBackend>>,
    /// First fatal error; returned from `main` once the loop stops.
    error: Option<anyhow::Error>,
}

impl StereoApp {
    fn new(config: RenderConfig, assets: SceneAssets) -> Self {
        Self {
            config,
            assets,
            input: ActionInput::new(0.0),
            window: None,
            orchestrator: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let target = self.config.target;
        let attrs = Window::default_attributes()
            .with_title("stereocube")
            .with_inner_size(PhysicalSize::new(
                2 * target.width * WINDOW_SCALE,
                target.height * WINDOW_SCALE,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("stereocube_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let backend = WgpuBackend::new(device, queue, surface, surface_config)?;
        let orchestrator = FrameOrchestrator::new(backend, self.config.clone(), &self.assets)
            .context("initializing renderer")?;
        tracing::info!("Up/Down: depth slider, Home/End: 2D/full 3D, Enter: exit");

        self.window = Some(window);
        self.orchestrator = Some(orchestrator);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(orchestrator) = &mut self.orchestrator else {
            return;
        };
        let snapshot = self.input.scan();
        match orchestrator.step(&snapshot) {
            Ok(LoopControl::Rendered(_)) => {}
            Ok(LoopControl::Exit) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for StereoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(orchestrator) = &mut self.orchestrator {
                    orchestrator
                        .backend_mut()
                        .resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.input
                    .apply(key_action(key, state == ElementState::Pressed));
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn load_texture(path: Option<&Path>) -> Result<Texture> {
    match path {
        Some(path) => {
            let texture = Texture::from_file(path)
                .with_context(|| format!("loading texture {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                width = texture.width(),
                height = texture.height(),
                "decoded texture"
            );
            Ok(texture)
        }
        None => Ok(Texture::checkerboard(
            128,
            8,
            [240, 240, 240, 255],
            [40, 60, 160, 255],
        )),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    let texture = load_texture(cli.texture.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = StereoApp::new(config, SceneAssets::cube(texture));
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => {
            tracing::info!("exited");
            Ok(())
        }
    }
}
