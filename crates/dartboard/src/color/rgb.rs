//! RGB colors, parsing and legibility.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DartboardError, Result};

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^rgba?\(\s*([0-9.]+)\s*,\s*([0-9.]+)\s*,\s*([0-9.]+)\s*(?:,\s*[0-9.]+%?\s*)?\)$",
    )
    .unwrap()
});

/// Luminance below which a light foreground is used.
pub const LUMINANCE_THRESHOLD: f64 = 0.5;

const NAMED: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("maroon", (128, 0, 0)),
    ("olive", (128, 128, 0)),
    ("silver", (192, 192, 192)),
];

/// A color with fractional channels in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Weighted-channel luminance on a 0-1 scale.
    pub fn luminance(&self) -> f64 {
        (0.299 * self.r + 0.587 * self.g + 0.114 * self.b) / 255.0
    }

    /// Foreground that stays legible on this background.
    pub fn foreground(&self) -> Foreground {
        if self.luminance() < LUMINANCE_THRESHOLD {
            Foreground::Light
        } else {
            Foreground::Dark
        }
    }

    /// Channel-wise linear blend; `weight` is the share of `other`.
    pub fn mix(&self, other: &Rgb, weight: f64) -> Rgb {
        let keep = 1.0 - weight;
        Rgb::new(
            self.r * keep + other.r * weight,
            self.g * keep + other.g * weight,
            self.b * keep + other.b * weight,
        )
    }

    /// Channels rounded to bytes.
    pub fn to_bytes(&self) -> (u8, u8, u8) {
        let byte = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        (byte(self.r), byte(self.g), byte(self.b))
    }

    /// `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.to_bytes();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Luminance of a color given as text.
pub fn luminance(color: &str) -> Result<f64> {
    Ok(color.parse::<Rgb>()?.luminance())
}

impl FromStr for Rgb {
    type Err = DartboardError;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
    /// and a small set of named colors.
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_ascii_lowercase();

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid(s));
        }

        if let Some(caps) = RGB_RE.captures(&text) {
            let channel = |i: usize| -> Result<f64> {
                let value: f64 = caps[i].parse().map_err(|_| invalid(s))?;
                if (0.0..=255.0).contains(&value) {
                    Ok(value)
                } else {
                    Err(invalid(s))
                }
            };
            return Ok(Rgb::new(channel(1)?, channel(2)?, channel(3)?));
        }

        NAMED
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, (r, g, b))| Rgb::new(f64::from(*r), f64::from(*g), f64::from(*b)))
            .ok_or_else(|| invalid(s))
    }
}

fn invalid(s: &str) -> DartboardError {
    DartboardError::Parse(format!("Unrecognized color '{}'", s))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(f64::from);
    let single = |i: usize| {
        u8::from_str_radix(&hex[i..i + 1], 16)
            .ok()
            .map(|v| f64::from(v * 17))
    };
    match hex.len() {
        3 | 4 => Some(Rgb::new(single(0)?, single(1)?, single(2)?)),
        6 | 8 => Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Text color chosen for a computed background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foreground {
    Light,
    Dark,
}

impl Foreground {
    /// CSS color name.
    pub fn css(&self) -> &'static str {
        match self {
            Foreground::Light => "white",
            Foreground::Dark => "black",
        }
    }
}
