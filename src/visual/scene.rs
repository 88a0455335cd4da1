//! Frame composition: backdrop, spectrum layers and pointer crosshair.
//!
//! Layers are drawn bottom-up: backdrop, peak wash, radial view, bar strip,
//! crosshair.

use image::RgbaImage;

use super::raster::{self, Region};
use super::spectrum::SpectrumRenderer;
use crate::audio::FrequencySnapshot;
use crate::color;
use crate::params::{RenderConfig, RenderModes};

/// Pointer position normalized to [0, 1] on both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

impl PointerState {
    /// Normalize a pixel position inside a `width` x `height` surface
    pub fn from_pixels(px: f64, py: f64, width: u32, height: u32) -> Self {
        let norm = |v: f64, extent: u32| {
            if extent == 0 {
                0.5
            } else {
                (v / extent as f64).clamp(0.0, 1.0) as f32
            }
        };
        Self {
            x: norm(px, width),
            y: norm(py, height),
        }
    }
}

/// Composes one visual frame per animation tick
pub struct Scene {
    config: RenderConfig,
    spectrum: SpectrumRenderer,
}

impl Scene {
    pub fn new(config: RenderConfig) -> Self {
        let spectrum = SpectrumRenderer::new(config.style.clone());
        Self { config, spectrum }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn modes(&self) -> RenderModes {
        self.config.modes
    }

    pub fn set_modes(&mut self, modes: RenderModes) {
        self.config.modes = modes;
    }

    /// Bottom strip reserved for the bar spectrum
    pub fn strip_region(&self, frame: &RgbaImage) -> Region {
        let height = self.config.spectrum_strip_height.min(frame.height()) as f32;
        Region::new(
            0.0,
            frame.height() as f32 - height,
            frame.width() as f32,
            height,
        )
    }

    /// Draw a full frame; `snapshot` is `None` while nothing is playing
    pub fn render(
        &self,
        frame: &mut RgbaImage,
        pointer: PointerState,
        snapshot: Option<&FrequencySnapshot>,
    ) {
        let backdrop = color::interpolate(pointer.x);
        raster::fill(frame, backdrop);

        if let Some(snapshot) = snapshot {
            let modes = self.config.modes;
            let full = Region::of(frame);
            if modes.peak {
                self.spectrum.draw_peak(snapshot, frame, full);
            }
            if modes.radial {
                self.spectrum.draw_radial(snapshot, frame, full);
            }
            if modes.bars {
                let strip = self.strip_region(frame);
                raster::fill_rect(frame, strip, backdrop);
                self.spectrum.draw_bars(snapshot, frame, strip);
            }
        }

        if self.config.show_crosshair {
            let color = self.config.crosshair_color;
            let alpha = self.config.crosshair_alpha;
            raster::draw_hline(frame, pointer.y * frame.height() as f32, color, alpha);
            raster::draw_vline(frame, pointer.x * frame.width() as f32, color, alpha);
        }
    }
}
