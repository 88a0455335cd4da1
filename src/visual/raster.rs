//! Minimal 2D drawing primitives on an RGBA frame.
//!
//! Coordinates are in pixels with the origin at the top-left corner. A pixel
//! is covered when its center lies inside the shape; everything outside the
//! frame is clipped.

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::color::Rgb;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame
    pub fn of(frame: &RgbaImage) -> Self {
        Self::new(0.0, 0.0, frame.width() as f32, frame.height() as f32)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Pixel index range whose centers fall in [start, end)
fn covered(start: f32, end: f32, limit: u32) -> std::ops::Range<u32> {
    let first = (start - 0.5).ceil().max(0.0);
    let last = (end - 0.5).ceil().clamp(0.0, limit as f32);
    if !(first < last) {
        return 0..0;
    }
    first as u32..last as u32
}

/// Source-over blend of `color` at `alpha` onto one pixel
pub fn blend_pixel(frame: &mut RgbaImage, x: u32, y: u32, color: Rgb, alpha: f32) {
    if x >= frame.width() || y >= frame.height() {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let Rgba([r, g, b, a]) = *frame.get_pixel(x, y);
    let mix = |dst: u8, src: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8;
    let out_alpha = (alpha * 255.0 + a as f32 * (1.0 - alpha)).round() as u8;
    frame.put_pixel(
        x,
        y,
        Rgba([mix(r, color.r), mix(g, color.g), mix(b, color.b), out_alpha]),
    );
}

/// Fill the whole frame with an opaque color
pub fn fill(frame: &mut RgbaImage, color: Rgb) {
    let pixel = color.to_rgba();
    for p in frame.pixels_mut() {
        *p = pixel;
    }
}

/// Fill an opaque rectangle
pub fn fill_rect(frame: &mut RgbaImage, rect: Region, color: Rgb) {
    let pixel = color.to_rgba();
    for y in covered(rect.y, rect.bottom(), frame.height()) {
        for x in covered(rect.x, rect.x + rect.width, frame.width()) {
            frame.put_pixel(x, y, pixel);
        }
    }
}

/// Blend a translucent rectangle over the frame
pub fn blend_rect(frame: &mut RgbaImage, rect: Region, color: Rgb, alpha: f32) {
    for y in covered(rect.y, rect.bottom(), frame.height()) {
        for x in covered(rect.x, rect.x + rect.width, frame.width()) {
            blend_pixel(frame, x, y, color, alpha);
        }
    }
}

/// Fill a translucent disc; a non-positive radius draws nothing
pub fn fill_circle(frame: &mut RgbaImage, center: Vec2, radius: f32, color: Rgb, alpha: f32) {
    if !(radius > 0.0) {
        return;
    }
    let rows = covered(center.y - radius, center.y + radius, frame.height());
    let cols = covered(center.x - radius, center.x + radius, frame.width());
    let r2 = radius * radius;
    for y in rows {
        for x in cols.clone() {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            if d.length_squared() <= r2 {
                blend_pixel(frame, x, y, color, alpha);
            }
        }
    }
}

/// One-pixel horizontal line across the frame
pub fn draw_hline(frame: &mut RgbaImage, y: f32, color: Rgb, alpha: f32) {
    if y < 0.0 || y >= frame.height() as f32 {
        return;
    }
    let row = y as u32;
    for x in 0..frame.width() {
        blend_pixel(frame, x, row, color, alpha);
    }
}

/// One-pixel vertical line down the frame
pub fn draw_vline(frame: &mut RgbaImage, x: f32, color: Rgb, alpha: f32) {
    if x < 0.0 || x >= frame.width() as f32 {
        return;
    }
    let col = x as u32;
    for y in 0..frame.height() {
        blend_pixel(frame, col, y, color, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    fn blank(w: u32, h: u32) -> RgbaImage {
        let mut frame = RgbaImage::new(w, h);
        fill(&mut frame, Rgb::BLACK);
        frame
    }

    fn count(frame: &RgbaImage, color: Rgb) -> usize {
        frame.pixels().filter(|p| **p == color.to_rgba()).count()
    }

    #[test]
    fn test_fill_rect_covers_pixel_centers() {
        let mut frame = blank(10, 10);
        fill_rect(&mut frame, Region::new(2.0, 3.0, 4.0, 2.0), RED);
        assert_eq!(count(&frame, RED), 8);
        assert_eq!(*frame.get_pixel(2, 3), RED.to_rgba());
        assert_eq!(*frame.get_pixel(5, 4), RED.to_rgba());
        assert_ne!(*frame.get_pixel(6, 4), RED.to_rgba());
    }

    #[test]
    fn test_fill_rect_clips_to_frame() {
        let mut frame = blank(4, 4);
        fill_rect(&mut frame, Region::new(-5.0, 2.0, 100.0, 100.0), RED);
        assert_eq!(count(&frame, RED), 8);
    }

    #[test]
    fn test_fractional_rect_rounds_by_center() {
        let mut frame = blank(10, 1);
        // Covers centers 1.5 and 2.5 only
        fill_rect(&mut frame, Region::new(1.2, 0.0, 1.6, 1.0), RED);
        assert_eq!(count(&frame, RED), 2);
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut frame = blank(1, 1);
        blend_pixel(&mut frame, 0, 0, Rgb::WHITE, 0.5);
        assert_eq!(*frame.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_blend_rect_only_touches_its_area() {
        let mut frame = blank(4, 2);
        blend_rect(&mut frame, Region::new(0.0, 0.0, 2.0, 2.0), Rgb::WHITE, 0.5);
        assert_eq!(*frame.get_pixel(1, 1), Rgba([128, 128, 128, 255]));
        assert_eq!(*frame.get_pixel(2, 1), Rgb::BLACK.to_rgba());
    }

    #[test]
    fn test_circle_is_round_and_clipped() {
        let mut frame = blank(21, 21);
        fill_circle(&mut frame, Vec2::new(10.5, 10.5), 5.0, RED, 1.0);
        assert_eq!(*frame.get_pixel(10, 10), RED.to_rgba());
        assert_ne!(*frame.get_pixel(5, 5), RED.to_rgba());
        let area = count(&frame, RED) as f32;
        let expected = std::f32::consts::PI * 25.0;
        assert!((area - expected).abs() < expected * 0.15, "area {area}");

        // Partially off-frame disc does not panic
        fill_circle(&mut frame, Vec2::new(0.0, 0.0), 8.0, RED, 1.0);
        fill_circle(&mut frame, Vec2::new(10.0, 10.0), 0.0, Rgb::WHITE, 1.0);
    }

    #[test]
    fn test_lines_outside_frame_are_ignored() {
        let mut frame = blank(4, 4);
        draw_hline(&mut frame, 1.0, RED, 1.0);
        draw_vline(&mut frame, 4.0, RED, 1.0);
        draw_hline(&mut frame, -1.0, RED, 1.0);
        assert_eq!(count(&frame, RED), 4);
    }
}
