//! noisefield - move the pointer, hear the noise, watch its spectrum.
//!
//! Holding the primary button plays noise whose amplitude follows the
//! pointer; the window shows the live spectrum of what is being played.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use image::RgbaImage;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use noisefield::audio::PlaybackController;
use noisefield::cli::Args;
use noisefield::headless::{self, HeadlessJob};
use noisefield::noise::{NoiseGenerator, NoiseParameters, NoiseType};
use noisefield::params::{AnalyserConfig, PlaybackConfig, RecordingConfig};
use noisefield::rendering::RenderSystem;
use noisefield::visual::{PointerState, Scene};

/// Volume change per Up/Down key press
const VOLUME_STEP: f32 = 0.05;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    scene: Scene,
    frame: RgbaImage,

    // Audio (None when no output device is usable)
    controller: Option<PlaybackController>,
    analyser_config: AnalyserConfig,
    playback_config: PlaybackConfig,
    seed: Option<u64>,

    // Input state
    pointer: PointerState,
    pointer_down: bool,
    noise_type: NoiseType,

    // Recording
    recording: Option<RecordingConfig>,
    frame_num: usize,
}

impl App {
    fn new(args: &Args, recording: Option<RecordingConfig>) -> Self {
        let render_config = args.render_config();
        let frame = RgbaImage::new(render_config.window_width, render_config.window_height);

        Self {
            window: None,
            render_system: None,
            scene: Scene::new(render_config),
            frame,
            controller: None,
            analyser_config: args.analyser_config(),
            playback_config: args.playback_config(),
            seed: args.seed,
            pointer: args.initial_pointer(),
            pointer_down: false,
            noise_type: args.parse_noise_type(),
            recording,
            frame_num: 0,
        }
    }

    fn noise_parameters(&self) -> Option<NoiseParameters> {
        match NoiseParameters::new(self.noise_type, self.pointer.x, self.pointer.y) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!("Ignoring pointer update: {}", e);
                None
            }
        }
    }

    fn start_noise(&mut self) {
        let Some(params) = self.noise_parameters() else {
            return;
        };
        if let Some(controller) = self.controller.as_mut() {
            if let Err(e) = controller.start(params) {
                error!("Failed to start noise: {}", e);
            }
        }
    }

    /// Replace the playing buffer with one for the current pointer
    fn restart_noise(&mut self) {
        let Some(params) = self.noise_parameters() else {
            return;
        };
        if let Some(controller) = self.controller.as_mut() {
            if let Err(e) = controller.restart(params) {
                error!("Failed to restart noise: {}", e);
            }
        }
    }

    fn stop_noise(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.is_playing())
    }

    fn set_noise_type(&mut self, kind: NoiseType) {
        if self.noise_type == kind {
            return;
        }
        info!("Noise: {}", kind);
        self.noise_type = kind;
        if self.is_playing() {
            self.restart_noise();
        }
    }

    fn step_volume(&mut self, delta: f32) {
        if let Some(controller) = self.controller.as_ref() {
            let level = controller.set_volume(controller.volume() + delta);
            info!("Volume: {:.2}", level);
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => {
                if self.is_playing() {
                    self.stop_noise();
                } else {
                    self.start_noise();
                }
            }
            KeyCode::Digit1 => self.set_noise_type(NoiseType::White),
            KeyCode::Digit2 => self.set_noise_type(NoiseType::Pink),
            KeyCode::Digit3 => self.set_noise_type(NoiseType::Brown),
            KeyCode::ArrowUp => self.step_volume(VOLUME_STEP),
            KeyCode::ArrowDown => self.step_volume(-VOLUME_STEP),
            KeyCode::KeyM => {
                let modes = self.scene.modes().next();
                info!("Render mode: {}", modes.name());
                self.scene.set_modes(modes);
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(render_system) = self.render_system.as_mut() {
            render_system.resize(width, height);
        }
        self.frame = RgbaImage::new(width, height);
    }

    /// Start playback for recording and save the buffer next to the frames
    fn begin_recording(&mut self) {
        let Some(config) = self.recording.clone() else {
            return;
        };
        self.start_noise();
        let buffer = self
            .controller
            .as_ref()
            .and_then(|c| c.session())
            .map(|s| s.buffer().clone());
        match buffer {
            Some(buffer) => match buffer.write_wav(config.audio_path()) {
                Ok(()) => info!("Saved audio to {}", config.audio_path().display()),
                Err(e) => error!("Failed to save audio: {}", e),
            },
            None => warn!("Recording without audio: no playback session"),
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let snapshot = self
            .controller
            .as_mut()
            .and_then(|c| c.frequency_snapshot());
        self.scene
            .render(&mut self.frame, self.pointer, snapshot.as_ref());

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        render_system.upload_frame(&self.frame);

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => error!("Render error: {:?}", e),
        }

        // Capture frame if recording
        if let Some(ref config) = self.recording {
            let path = config.frame_path(self.frame_num);
            if let Err(e) = self.frame.save(&path) {
                error!("Failed to save frame {}: {}", self.frame_num, e);
            }
            self.frame_num += 1;
            if self.frame_num >= config.total_frames() {
                info!("Recording complete ({} frames)", self.frame_num);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let config = self.scene.config();
        let window_attributes = Window::default_attributes()
            .with_title("noisefield")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window_width,
                config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(Arc::clone(&window))) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!("Failed to initialize rendering: {}", e);
                event_loop.exit();
                return;
            }
        };
        let (width, height) = render_system.size();

        self.controller = match PlaybackController::new(
            self.analyser_config.clone(),
            self.playback_config.clone(),
            self.seed,
        ) {
            Ok(controller) => Some(controller),
            Err(e) => {
                error!("Audio unavailable, running visuals only: {}", e);
                None
            }
        };

        info!("noisefield is running");
        info!("Hold the mouse button to play, Space start/stop, 1/2/3 noise type, Up/Down volume, M view, Esc quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.resize(width, height);
        self.begin_recording();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::CursorMoved { position, .. } => {
                let (width, height) = (self.frame.width(), self.frame.height());
                self.pointer = PointerState::from_pixels(position.x, position.y, width, height);
                if self.pointer_down {
                    self.restart_noise();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.pointer_down = true;
                    self.restart_noise();
                }
                ElementState::Released => {
                    self.pointer_down = false;
                    self.stop_noise();
                }
            },
            WindowEvent::CursorLeft { .. } => {
                if self.pointer_down {
                    self.pointer_down = false;
                    self.stop_noise();
                }
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop_noise();
    }
}

/// Generate one buffer and write it to `args.export_wav`
fn export_wav(args: &Args) -> anyhow::Result<()> {
    let Some(ref path) = args.export_wav else {
        return Ok(());
    };
    let params = args.noise_parameters()?;
    let mut generator = NoiseGenerator::new(args.sample_rate, args.seed)?;
    let buffer = generator.generate_secs(&params, args.buffer_seconds)?;
    buffer
        .write_wav(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(
        "Wrote {:.2}s of {} noise (peak {:.3}) to {}",
        buffer.duration_secs(),
        params.kind,
        buffer.peak(),
        path.display()
    );
    Ok(())
}

fn run_headless(args: &Args) -> anyhow::Result<()> {
    let Some(recording) = args.create_recording_config()? else {
        bail!("--headless needs --record SECONDS to know how many frames to render");
    };
    let job = HeadlessJob {
        params: args.noise_parameters()?,
        sample_rate: args.sample_rate,
        seed: args.seed,
        analyser: args.analyser_config(),
        playback: args.playback_config(),
        render: args.render_config(),
        recording,
    };
    let summary = headless::run(&job)?;
    info!(
        "Headless run finished: {} frames, mean spectrum level {:.1}",
        summary.frames_written, summary.mean_level
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.export_wav.is_some() {
        return export_wav(&args);
    }
    if args.headless {
        return run_headless(&args);
    }

    args.analyser_config().validate()?;
    args.playback_config().validate()?;
    let recording = args.create_recording_config()?;

    let mut app = App::new(&args, recording);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
