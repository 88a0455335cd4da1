//! Spectrum visualizations: vertical bars, radial discs and a peak wash.

use std::f32::consts::TAU;

use glam::Vec2;
use image::RgbaImage;

use super::raster::{self, Region};
use crate::audio::FrequencySnapshot;
use crate::color::{self, Rgb};
use crate::params::SpectrumStyle;

/// Draws frequency snapshots onto RGBA frames
#[derive(Debug, Clone, Default)]
pub struct SpectrumRenderer {
    style: SpectrumStyle,
}

impl SpectrumRenderer {
    pub fn new(style: SpectrumStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &SpectrumStyle {
        &self.style
    }

    /// Color of a bar for a bin magnitude
    pub fn bar_color(&self, magnitude: u8) -> Rgb {
        let red = (magnitude as f32 / 2.0 + self.style.bar_base_red)
            .round()
            .clamp(0.0, 255.0) as u8;
        let gb = self.style.bar_green_blue;
        Rgb::new(red, gb, gb)
    }

    /// Background of the radial mode for an average magnitude
    pub fn radial_background(&self, average: f32) -> Rgb {
        let level = average.clamp(0.0, 255.0).round() as u8;
        Rgb::new(level, 255 - level, self.style.radial_background_blue)
    }

    /// Disc center and radius for bin `index` of `bin_count`
    pub fn disc(&self, center: Vec2, index: usize, bin_count: usize, magnitude: u8) -> (Vec2, f32) {
        let radius = magnitude as f32 / self.style.disc_radius_divisor;
        let angle = index as f32 / bin_count as f32 * TAU;
        let offset = Vec2::new(angle.cos(), angle.sin()) * radius * self.style.radial_multiplier;
        (center + offset, radius)
    }

    /// One bar per bin, anchored to the bottom of `region`.
    ///
    /// Bars are `width / bin_count` wide and advance by that plus the gap,
    /// so the last bars run past the right edge and are clipped.
    pub fn draw_bars(&self, snapshot: &FrequencySnapshot, frame: &mut RgbaImage, region: Region) {
        let bins = snapshot.bins();
        if bins.is_empty() {
            return;
        }
        let bar_width = region.width / bins.len() as f32;
        let right = region.x + region.width;

        let mut x = region.x;
        for &magnitude in bins {
            if x >= right {
                break;
            }
            let height = (magnitude as f32 / 2.0).min(region.height);
            if height > 0.0 {
                let width = bar_width.min(right - x);
                let bar = Region::new(x, region.bottom() - height, width, height);
                raster::fill_rect(frame, bar, self.bar_color(magnitude));
            }
            x += bar_width + self.style.bar_gap_px;
        }
    }

    /// Peak level as (palette color, opacity), both driven by `peak / 255`
    pub fn peak_wash(&self, peak: u8) -> (Rgb, f32) {
        let intensity = peak as f32 / 255.0;
        (color::interpolate(intensity), intensity)
    }

    /// Wash `region` with the palette color of the loudest bin
    pub fn draw_peak(&self, snapshot: &FrequencySnapshot, frame: &mut RgbaImage, region: Region) {
        let (wash, alpha) = self.peak_wash(snapshot.peak());
        if alpha > 0.0 {
            raster::blend_rect(frame, region, wash, alpha);
        }
    }

    /// Average-driven background plus one translucent disc per bin
    pub fn draw_radial(&self, snapshot: &FrequencySnapshot, frame: &mut RgbaImage, region: Region) {
        raster::fill_rect(frame, region, self.radial_background(snapshot.average()));

        let bins = snapshot.bins();
        let center = region.center();
        for (i, &magnitude) in bins.iter().enumerate() {
            let (disc_center, radius) = self.disc(center, i, bins.len(), magnitude);
            raster::fill_circle(
                frame,
                disc_center,
                radius,
                self.style.disc_color,
                self.style.disc_alpha,
            );
        }
    }
}
