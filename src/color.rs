//! Pastel palette interpolation and hex color helpers.

use std::fmt;

use crate::error::{NoiseFieldError, Result};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value (upper byte ignored)
    pub const fn from_u24(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub const fn to_u24(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Channels as an array, red first
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Opaque RGBA pixel
    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }

    /// Linear blend towards `other` by `t` in [0, 1], rounded per channel
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round() as u8;
        Rgb::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

/// CSS functional notation, e.g. `rgb(176, 224, 230)`
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Backdrop palette, light blues ordered left to right across the window
pub const PALETTE: [Rgb; 6] = [
    Rgb::from_u24(0xb0e0e6),
    Rgb::from_u24(0xadd8e6),
    Rgb::from_u24(0x87cefa),
    Rgb::from_u24(0xb0c4de),
    Rgb::from_u24(0xafeeee),
    Rgb::from_u24(0xe0ffff),
];

/// Interpolate across [`PALETTE`]; `t` is clamped to [0, 1]
pub fn interpolate(t: f32) -> Rgb {
    interpolate_in(&PALETTE, t)
}

/// Interpolate across any non-empty palette; `t` is clamped to [0, 1]
pub fn interpolate_in(palette: &[Rgb], t: f32) -> Rgb {
    match palette {
        [] => Rgb::BLACK,
        [only] => *only,
        _ => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let index = t * (palette.len() - 1) as f32;
            let lower = index.floor() as usize;
            let upper = (index.ceil() as usize).min(palette.len() - 1);
            palette[lower].lerp(palette[upper], index - lower as f32)
        }
    }
}

/// Parse `#rrggbb` (the leading `#` is optional)
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(NoiseFieldError::invalid(
            "hex color",
            format!("expected #rrggbb, got '{}'", hex),
        ));
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|e| NoiseFieldError::invalid("hex color", e.to_string()))?;
    Ok(Rgb::from_u24(value))
}

/// Format as lowercase `#rrggbb`
pub fn rgb_to_hex(color: Rgb) -> String {
    format!("#{:06x}", color.to_u24())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        assert_eq!(interpolate(0.0), PALETTE[0]);
        assert_eq!(interpolate(1.0), PALETTE[PALETTE.len() - 1]);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(interpolate(-3.0), PALETTE[0]);
        assert_eq!(interpolate(7.5), PALETTE[5]);
        assert_eq!(interpolate(f32::NAN), PALETTE[0]);
    }

    #[test]
    fn test_stops_land_on_palette_entries() {
        for (i, color) in PALETTE.iter().enumerate() {
            let t = i as f32 / (PALETTE.len() - 1) as f32;
            assert_eq!(interpolate(t), *color, "stop {i}");
        }
    }

    #[test]
    fn test_midpoint_blend_rounds() {
        // Halfway between #b0e0e6 and #add8e6
        let mid = interpolate(0.1);
        assert_eq!(mid, Rgb::new(175, 220, 230));
    }

    #[test]
    fn test_monotonic_between_stops() {
        let segments = PALETTE.len() - 1;
        for seg in 0..segments {
            let (from, to) = (PALETTE[seg], PALETTE[seg + 1]);
            let mut prev = from;
            for step in 1..=20 {
                let t = (seg as f32 + step as f32 / 20.0) / segments as f32;
                let c = interpolate(t);
                for ch in 0..3 {
                    let (a, b) = (from.channels()[ch], to.channels()[ch]);
                    let (p, n) = (prev.channels()[ch], c.channels()[ch]);
                    if b >= a {
                        assert!(n >= p, "segment {seg} channel {ch} decreased");
                    } else {
                        assert!(n <= p, "segment {seg} channel {ch} increased");
                    }
                }
                prev = c;
            }
        }
    }

    #[test]
    fn test_hex_round_trip() {
        for value in [0x000000, 0xffffff, 0xb0e0e6, 0x123456, 0x00ff7f, 0xabcdef] {
            let c = Rgb::from_u24(value);
            assert_eq!(hex_to_rgb(&rgb_to_hex(c)).unwrap(), c);
        }
        // Sweep every channel value
        for v in 0..=255u8 {
            let c = Rgb::new(v, 255 - v, v / 2);
            assert_eq!(hex_to_rgb(&rgb_to_hex(c)).unwrap(), c);
        }
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(hex_to_rgb("#b0e0e6").unwrap(), Rgb::new(176, 224, 230));
        assert_eq!(hex_to_rgb("E0FFFF").unwrap(), Rgb::new(224, 255, 255));
        assert!(hex_to_rgb("#fff").is_err());
        assert!(hex_to_rgb("#gggggg").is_err());
        assert!(hex_to_rgb("#+12345").is_err());
    }

    #[test]
    fn test_css_display() {
        assert_eq!(PALETTE[0].to_string(), "rgb(176, 224, 230)");
    }
}
