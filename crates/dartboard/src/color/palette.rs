//! Palette specifications, color maps and per-attribute color sets.
//!
//! A palette spec is a comma separated list of colors, each optionally
//! followed by one or more `NN%` placements:
//!
//! ```text
//! #b2182b, #f7f7f7, #2166ac
//! red 0%, white 40% 60%, blue 100%
//! ```
//!
//! Bare colors are spread evenly across `[0, 1]`.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DartboardError, Result};

use super::rgb::{Foreground, Rgb};

/// Tick spacing used by [`ColorMap::colorbar_ticks`] callers by default.
pub const DEFAULT_TICK_STEP: f64 = 0.5;

/// A color pinned at a position in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Rgb,
    pub placement: f64,
}

/// Piecewise-linear continuous color map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    stops: Vec<ColorStop>,
    /// Number of entries in the spec, used for categorical spacing.
    input_len: usize,
    min_value: f64,
    max_value: f64,
}

impl ColorMap {
    /// Parse a palette spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let entries = split_top_level(spec);
        Self::from_entries(&entries)
    }

    /// Build from individual `color [NN%]*` entries.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let entries: Vec<&str> = entries
            .iter()
            .map(|e| e.as_ref().trim())
            .filter(|e| !e.is_empty())
            .collect();
        if entries.is_empty() {
            return Err(DartboardError::Parse("Palette has no colors".into()));
        }

        let last = entries.len().saturating_sub(1);
        let mut stops = Vec::with_capacity(entries.len() + 2);
        for (index, entry) in entries.iter().enumerate() {
            let (color, placements) = split_placements(entry)?;
            let color: Rgb = color.parse()?;
            if placements.is_empty() {
                let placement = if last == 0 {
                    0.0
                } else {
                    index as f64 / last as f64
                };
                stops.push(ColorStop { color, placement });
            } else {
                stops.extend(placements.into_iter().map(|placement| ColorStop { color, placement }));
            }
        }

        stops.sort_by(|a, b| a.placement.total_cmp(&b.placement));
        if let Some(first) = stops.first().copied() {
            if first.placement != 0.0 {
                stops.insert(0, ColorStop { color: first.color, placement: 0.0 });
            }
        }
        if let Some(end) = stops.last().copied() {
            if end.placement != 1.0 {
                stops.push(ColorStop { color: end.color, placement: 1.0 });
            }
        }

        Ok(Self {
            stops,
            input_len: entries.len(),
            min_value: 0.0,
            max_value: 1.0,
        })
    }

    /// Map values from `[min, max]` instead of `[0, 1]`.
    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        if min.is_finite() && max.is_finite() && max > min {
            self.min_value = min;
            self.max_value = max;
        }
        self
    }

    /// Normalized stops, sorted by placement; always includes 0 and 1.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Stop placements in order.
    pub fn placements(&self) -> Vec<f64> {
        self.stops.iter().map(|s| s.placement).collect()
    }

    /// Number of colors in the spec.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    fn normalize(&self, value: f64) -> f64 {
        let span = self.max_value - self.min_value;
        let position = (value - self.min_value) / span;
        if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        }
    }

    fn first_at(&self, placement: f64) -> Rgb {
        self.stops
            .iter()
            .find(|s| s.placement == placement)
            .map(|s| s.color)
            .unwrap_or(self.stops[0].color)
    }

    /// Interpolated color for a value in the map's domain. Out-of-range
    /// values are clamped to the end colors.
    pub fn get_color(&self, value: f64) -> Rgb {
        let position = self.normalize(value);
        let lower = self
            .stops
            .iter()
            .map(|s| s.placement)
            .filter(|p| *p <= position)
            .fold(0.0_f64, f64::max);
        let upper = self
            .stops
            .iter()
            .map(|s| s.placement)
            .filter(|p| *p >= position)
            .fold(1.0_f64, f64::min);

        let weight = (position - lower) / (upper - lower);
        let weight = if weight.is_finite() { weight } else { 0.0 };
        self.first_at(lower).mix(&self.first_at(upper), weight)
    }

    /// Color for category `index` of `count`, spaced over at least as many
    /// positions as the spec has colors.
    pub fn get_cat(&self, index: usize, count: usize) -> Rgb {
        let slots = count.max(self.input_len);
        if slots <= 1 {
            return self.get_color(self.min_value);
        }
        let position = index as f64 / (slots - 1) as f64;
        self.get_color(self.min_value + position * (self.max_value - self.min_value))
    }

    /// `(position, color)` ticks from 0 to 1 inclusive.
    pub fn colorbar_ticks(&self, step: f64) -> Result<Vec<(f64, Rgb)>> {
        if !(step.is_finite() && step > 0.0) {
            return Err(DartboardError::Parse(format!("Invalid colorbar step {}", step)));
        }
        let count = (1.0 / step + 1e-9).floor() as usize;
        let mut positions: Vec<f64> = (0..=count).map(|i| (i as f64 * step).min(1.0)).collect();
        if positions.last().is_some_and(|p| *p < 1.0 - 1e-9) {
            positions.push(1.0);
        }
        Ok(positions
            .into_iter()
            .map(|p| {
                let value = self.min_value + p * (self.max_value - self.min_value);
                (p, self.get_color(value))
            })
            .collect())
    }
}

impl FromStr for ColorMap {
    type Err = DartboardError;

    fn from_str(s: &str) -> Result<Self> {
        ColorMap::parse(s)
    }
}

/// Split on commas that are not inside parentheses.
fn split_top_level(spec: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in spec.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(spec[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(spec[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Separate trailing `NN%` tokens from the color text.
fn split_placements(entry: &str) -> Result<(&str, Vec<f64>)> {
    let mut color = entry.trim();
    let mut placements = Vec::new();
    while let Some((head, tail)) = color.rsplit_once(char::is_whitespace) {
        let Some(number) = tail.strip_suffix('%') else {
            break;
        };
        let percent: f64 = number
            .parse()
            .map_err(|_| DartboardError::Parse(format!("Invalid placement '{}' in '{}'", tail, entry)))?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(DartboardError::Parse(format!(
                "Placement '{}' in '{}' is outside 0%..100%",
                tail, entry
            )));
        }
        placements.push(percent / 100.0);
        color = head.trim_end();
    }
    if color.ends_with('%') {
        return Err(DartboardError::Parse(format!("Palette entry '{}' has no color", entry)));
    }
    placements.reverse();
    Ok((color, placements))
}

/// Colors for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "colors", rename_all = "snake_case")]
pub enum ColorSet {
    /// One color per category value, in value order.
    Categorical(IndexMap<String, Rgb>),
    /// Interpolated over a numeric domain.
    Continuous(ColorMap),
}

impl ColorSet {
    /// Assign each value a categorical color from the map.
    pub fn categorical<S: AsRef<str>>(map: &ColorMap, values: &[S]) -> Self {
        ColorSet::Categorical(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (v.as_ref().to_string(), map.get_cat(i, values.len())))
                .collect(),
        )
    }

    /// Color for a value. Categorical lookups fall back to numeric
    /// equality so `"1.0"` finds the color of `"1"`.
    pub fn color_for(&self, value: &str) -> Option<Rgb> {
        match self {
            ColorSet::Categorical(colors) => colors.get(value).copied().or_else(|| {
                let number: f64 = value.trim().parse().ok()?;
                colors
                    .iter()
                    .find(|(k, _)| k.trim().parse::<f64>().ok() == Some(number))
                    .map(|(_, c)| *c)
            }),
            ColorSet::Continuous(map) => value.trim().parse().ok().map(|v| map.get_color(v)),
        }
    }

    /// Background and foreground for a value.
    pub fn swatch(&self, value: &str) -> Option<(Rgb, Foreground)> {
        self.color_for(value).map(|c| (c, c.foreground()))
    }
}

/// Build a color set from a palette spec and the attribute's ordered values.
/// An empty value list yields a continuous set.
pub fn build_palette<S: AsRef<str>>(spec: &str, values: &[S]) -> Result<ColorSet> {
    let map = ColorMap::parse(spec)?;
    if values.is_empty() {
        Ok(ColorSet::Continuous(map))
    } else {
        Ok(ColorSet::categorical(&map, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_even_spacing() {
        let map = ColorMap::parse("#000000, #808080, #ffffff").unwrap();
        assert_eq!(map.placements(), vec![0.0, 0.5, 1.0]);
        let quarter = map.get_color(0.25);
        assert!(close(quarter.r, 64.0));
    }

    #[test]
    fn test_explicit_placements_and_endpoints() {
        let map = ColorMap::parse("red 20%, rgb(0, 0, 255) 60% 80%").unwrap();
        assert_eq!(map.placements(), vec![0.0, 0.2, 0.6, 0.8, 1.0]);
        assert_eq!(map.get_color(0.0), Rgb::new(255.0, 0.0, 0.0));
        assert_eq!(map.get_color(1.0), Rgb::new(0.0, 0.0, 255.0));
        assert_eq!(map.get_color(0.7), Rgb::new(0.0, 0.0, 255.0));
    }

    #[test]
    fn test_clamps_out_of_range() {
        let map = ColorMap::parse("black, white").unwrap();
        assert_eq!(map.get_color(-3.0), map.get_color(0.0));
        assert_eq!(map.get_color(7.0), map.get_color(1.0));
        assert_eq!(map.get_color(f64::NAN), map.get_color(0.0));
    }

    #[test]
    fn test_single_color() {
        let map = ColorMap::parse("#123456").unwrap();
        assert_eq!(map.placements(), vec![0.0, 1.0]);
        assert_eq!(map.get_color(0.3).to_hex(), "#123456");
    }

    #[test]
    fn test_domain() {
        let map = ColorMap::parse("black, white").unwrap().with_domain(10.0, 20.0);
        assert!(close(map.get_color(15.0).g, 127.5));
    }

    #[test]
    fn test_get_cat_spacing() {
        let map = ColorMap::parse("black, white").unwrap();
        assert_eq!(map.get_cat(0, 3), Rgb::new(0.0, 0.0, 0.0));
        assert!(close(map.get_cat(1, 3).r, 127.5));
        assert_eq!(map.get_cat(2, 3), Rgb::new(255.0, 255.0, 255.0));
        // Fewer categories than colors still spreads over the spec.
        let wide = ColorMap::parse("black, gray, white").unwrap();
        assert_eq!(wide.get_cat(1, 2), wide.get_color(0.5));
    }

    #[test]
    fn test_colorbar_ticks() {
        let map = ColorMap::parse("black, white").unwrap();
        let ticks = map.colorbar_ticks(DEFAULT_TICK_STEP).unwrap();
        assert_eq!(ticks.iter().map(|t| t.0).collect::<Vec<_>>(), vec![0.0, 0.5, 1.0]);
        let uneven = map.colorbar_ticks(0.4).unwrap();
        assert_eq!(uneven.last().unwrap().0, 1.0);
        assert!(map.colorbar_ticks(0.0).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(ColorMap::parse("").is_err());
        assert!(ColorMap::parse("notacolor").is_err());
        assert!(ColorMap::parse("red x%").is_err());
    }

    #[test]
    fn test_rejects_placements_outside_unit_range() {
        assert!(ColorMap::parse("red 0%, blue 150%").is_err());
        assert!(ColorMap::parse("red -10%, blue").is_err());
        assert!(ColorMap::parse("red NaN%").is_err());
        let map = ColorMap::parse("red 0%, blue 100%").unwrap();
        assert_eq!(map.placements(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_categorical_set_numeric_fallback() {
        let set = build_palette("black, white", &["1", "2"]).unwrap();
        assert_eq!(set.color_for("1"), Some(Rgb::new(0.0, 0.0, 0.0)));
        assert_eq!(set.color_for("2.0"), Some(Rgb::new(255.0, 255.0, 255.0)));
        assert_eq!(set.color_for("3"), None);
        assert_eq!(set.swatch("1").unwrap().1, Foreground::Light);
    }

    #[test]
    fn test_continuous_set() {
        let set = build_palette::<&str>("black, white", &[]).unwrap();
        assert!(matches!(set, ColorSet::Continuous(_)));
        assert_eq!(set.color_for("1"), Some(Rgb::new(255.0, 255.0, 255.0)));
        assert_eq!(set.color_for("high"), None);
    }
}
