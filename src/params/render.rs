//! Rendering and recording configuration.

use std::path::PathBuf;

use crate::color::Rgb;

/// Which spectrum visualizations are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderModes {
    /// Radial discs over an average-driven background (main surface)
    pub radial: bool,

    /// Vertical bars in the bottom strip
    pub bars: bool,

    /// Whole-frame palette wash whose color and opacity follow the loudest bin
    pub peak: bool,
}

impl Default for RenderModes {
    fn default() -> Self {
        Self::BOTH
    }
}

impl RenderModes {
    pub const RADIAL: RenderModes = RenderModes {
        radial: true,
        bars: false,
        peak: false,
    };
    pub const BARS: RenderModes = RenderModes {
        radial: false,
        bars: true,
        peak: false,
    };
    pub const BOTH: RenderModes = RenderModes {
        radial: true,
        bars: true,
        peak: false,
    };
    pub const PEAK: RenderModes = RenderModes {
        radial: false,
        bars: false,
        peak: true,
    };

    /// Parse `radial`, `bars`, `both` or `peak`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "radial" => Some(Self::RADIAL),
            "bars" | "bar" => Some(Self::BARS),
            "both" => Some(Self::BOTH),
            "peak" => Some(Self::PEAK),
            _ => None,
        }
    }

    /// Cycle radial -> bars -> both -> peak -> radial
    pub fn next(self) -> Self {
        match self {
            Self::RADIAL => Self::BARS,
            Self::BARS => Self::BOTH,
            Self::BOTH => Self::PEAK,
            _ => Self::RADIAL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RADIAL => "radial",
            Self::BARS => "bars",
            Self::BOTH => "both",
            Self::PEAK => "peak",
            _ => "custom",
        }
    }
}

/// Colors and scale factors of the spectrum drawings
#[derive(Debug, Clone)]
pub struct SpectrumStyle {
    /// Red offset added to half the magnitude for bars
    pub bar_base_red: f32,

    /// Fixed green and blue channel of bars
    pub bar_green_blue: u8,

    /// Horizontal gap after each bar (pixels)
    pub bar_gap_px: f32,

    /// Disc radius = magnitude / this divisor (pixels)
    pub disc_radius_divisor: f32,

    /// Disc distance from center = radius * this multiplier
    pub radial_multiplier: f32,

    /// Disc fill color
    pub disc_color: Rgb,

    /// Disc opacity (0..=1)
    pub disc_alpha: f32,

    /// Blue channel of the radial background
    pub radial_background_blue: u8,
}

impl Default for SpectrumStyle {
    fn default() -> Self {
        Self {
            bar_base_red: 100.0,
            bar_green_blue: 150,
            bar_gap_px: 1.0,
            disc_radius_divisor: 5.0,
            radial_multiplier: 3.0,
            disc_color: Rgb::WHITE,
            disc_alpha: 0.5,
            radial_background_blue: 200,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Height of the bar strip along the bottom edge (pixels)
    pub spectrum_strip_height: u32,

    pub modes: RenderModes,

    /// Draw horizontal and vertical lines through the pointer
    pub show_crosshair: bool,

    /// Crosshair line color
    pub crosshair_color: Rgb,

    /// Crosshair opacity (0..=1)
    pub crosshair_alpha: f32,

    pub style: SpectrumStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            spectrum_strip_height: 200,
            modes: RenderModes::default(),
            show_crosshair: true,
            crosshair_color: Rgb::new(51, 51, 51),
            crosshair_alpha: 0.6,
            style: SpectrumStyle::default(),
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: PathBuf,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Path of a single numbered frame
    pub fn frame_path(&self, frame_num: usize) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame_num))
    }

    /// Audio file path
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }

    /// Create the output directories
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.frames_dir())
    }
}
