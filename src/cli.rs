//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::noise::{NoiseParameters, NoiseType};
use crate::params::{AnalyserConfig, PlaybackConfig, RecordingConfig, RenderConfig, RenderModes};
use crate::visual::PointerState;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "noisefield")]
#[command(about = "Pointer-driven noise generator with a reactive spectrum", long_about = None)]
pub struct Args {
    /// Noise color: white (default), pink, brown
    #[arg(long, value_name = "TYPE", default_value = "white")]
    pub noise: String,

    /// Initial horizontal pointer position / x bias (0..1)
    #[arg(long, value_name = "X", default_value_t = 0.5)]
    pub x: f32,

    /// Initial vertical pointer position / y bias (0..1)
    #[arg(long, value_name = "Y", default_value_t = 0.5)]
    pub y: f32,

    /// Spectrum view: radial, bars, both (default), peak
    #[arg(long, value_name = "MODE", default_value = "both")]
    pub mode: String,

    /// Seed for reproducible noise
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Analyser transform size (power of 2)
    #[arg(long, value_name = "SAMPLES", default_value_t = 256)]
    pub fft_size: usize,

    /// Length of each generated buffer (seconds)
    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    pub buffer_seconds: f32,

    /// Output volume (0..1); Up/Down adjust it while running
    #[arg(long, value_name = "LEVEL", default_value_t = 0.5)]
    pub volume: f32,

    /// Record frames and audio for this many seconds, then exit
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Render without a window or audio device (requires --record)
    #[arg(long)]
    pub headless: bool,

    /// Sample rate used when no device is involved (Hz)
    #[arg(long, value_name = "HZ", default_value_t = 44100)]
    pub sample_rate: u32,

    /// Frame width (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Frame height (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Write one generated buffer to a WAV file and exit
    #[arg(long, value_name = "PATH")]
    pub export_wav: Option<PathBuf>,
}

impl Args {
    /// Parse noise type from command-line arguments
    pub fn parse_noise_type(&self) -> NoiseType {
        match self.noise.parse::<NoiseType>() {
            Ok(kind) => {
                info!("Noise: {}", kind);
                kind
            }
            Err(e) => {
                warn!("{}; using white", e);
                NoiseType::White
            }
        }
    }

    /// Parse render modes from command-line arguments
    pub fn parse_modes(&self) -> RenderModes {
        RenderModes::parse(&self.mode).unwrap_or_else(|| {
            warn!("Unknown render mode '{}', using both", self.mode);
            RenderModes::BOTH
        })
    }

    /// Initial pointer, clamped into the unit square
    pub fn initial_pointer(&self) -> PointerState {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
        PointerState {
            x: unit(self.x),
            y: unit(self.y),
        }
    }

    /// Noise parameters for the initial pointer
    pub fn noise_parameters(&self) -> crate::error::Result<NoiseParameters> {
        let pointer = self.initial_pointer();
        NoiseParameters::new(self.parse_noise_type(), pointer.x, pointer.y)
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.fft_size,
            ..Default::default()
        }
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            buffer_seconds: self.buffer_seconds,
            volume: self.volume,
            ..Default::default()
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            modes: self.parse_modes(),
            ..Default::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> std::io::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        // Create output directories
        config.create_dirs()?;
        info!(
            "Recording {:.1}s at {} fps into {}",
            duration,
            config.fps,
            config.output_dir.display()
        );

        Ok(Some(config))
    }
}
