//! Intensity → colour mapping. Each palette is a closed-form curve over [0, 1].

use std::f64::consts::SQRT_2;
use std::fmt;

use serde::Serialize;

use crate::error::{MapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Selector 0: black to olive, input compressed by 0.8.
    Olive,
    /// Selector 1: dark red through a dim midpoint to teal.
    #[default]
    RedTeal,
    /// Selector 2: red through black to blue.
    RedBlue,
}

impl Palette {
    pub const ALL: [Palette; 3] = [Palette::Olive, Palette::RedTeal, Palette::RedBlue];

    pub fn from_selector(selector: i64) -> Result<Self> {
        let palette = match selector {
            0 => Palette::Olive,
            1 => Palette::RedTeal,
            2 => Palette::RedBlue,
            other => return Err(MapError::InvalidPalette(other)),
        };
        debug_assert!(palette.color(0.0).is_in_unit_range());
        Ok(palette)
    }

    pub fn selector(self) -> u8 {
        match self {
            Palette::Olive => 0,
            Palette::RedTeal => 1,
            Palette::RedBlue => 2,
        }
    }

    pub fn color(self, x: f64) -> Rgb {
        intensity_to_rgb(x, self)
    }
}

impl TryFrom<i64> for Palette {
    type Error = MapError;

    fn try_from(selector: i64) -> Result<Self> {
        Palette::from_selector(selector)
    }
}

/// Colour with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn is_in_unit_range(self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }

    /// Scale each channel to 0–255, truncating.
    pub fn to_rgb8(self) -> [u8; 3] {
        [channel_u8(self.r), channel_u8(self.g), channel_u8(self.b)]
    }

    /// `#RRGGBB`, uppercase.
    pub fn to_hex(self) -> String {
        rgb8_to_hex(self.to_rgb8())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// `as` saturates, so out-of-range intensities clip to 0 or 255.
fn channel_u8(c: f64) -> u8 {
    (255.0 * c) as u8
}

pub fn intensity_to_rgb(x: f64, palette: Palette) -> Rgb {
    match palette {
        Palette::Olive => {
            // Avoid pure black and pure white, both hard to see on the map.
            let x = x * 0.8;
            let v = x * x / SQRT_2;
            Rgb::new(v, v, 0.0)
        }
        Palette::RedTeal => {
            let lo = (1.0 - x).powi(2) / SQRT_2;
            let hi = x * x / SQRT_2;
            Rgb::new(lo, hi, hi)
        }
        Palette::RedBlue => Rgb::new((1.0 - x).powi(2), 0.0, x * x),
    }
}

pub fn rgb8_to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Parse `#RRGGBB` (either case) back into 0–255 channels.
pub fn hex_to_rgb8(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
