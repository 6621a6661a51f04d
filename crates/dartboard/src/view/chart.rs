//! Bar chart layout for distribution comparisons.
//!
//! Vertical layout: with `N` values, bar width is
//! `min(default_bar_width, max_width / (N + bar_padding * (N - 1)))`, and a
//! value with proportion `p` gets height `plot_height * p / (max * hover_scale)`
//! where `max` is the largest proportion when `scale_height` is set and 1
//! otherwise. The hover scale keeps an enlarged bar inside the plot area.

use serde::{Deserialize, Serialize};

/// Layout constants for bar charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarChartConfig {
    pub default_bar_width: f64,
    /// Upper bound on the plot extent along the bar axis; 0 disables it.
    pub max_width: f64,
    pub total_height: f64,
    /// Gap between bars as a fraction of bar width.
    pub bar_padding: f64,
    pub line_width: f64,
    /// Growth factor applied to a hovered bar.
    pub hover_scale: f64,
    /// Stretch so the tallest bar fills the plot.
    pub scale_height: bool,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            default_bar_width: 20.0,
            max_width: 200.0,
            total_height: 100.0,
            bar_padding: 0.2,
            line_width: 1.0,
            hover_scale: 1.1,
            scale_height: true,
        }
    }
}

impl BarChartConfig {
    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_scale_height(mut self, scale_height: bool) -> Self {
        self.scale_height = scale_height;
        self
    }

    /// Thickness of each bar for `count` bars within `extent`.
    fn bar_thickness(&self, count: usize, extent: f64) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let slots = count as f64 + self.bar_padding * (count as f64 - 1.0);
        if extent > 0.0 {
            self.default_bar_width.min(extent / slots)
        } else {
            self.default_bar_width
        }
    }

    /// Length of a bar for proportion `p`, given the largest proportion.
    fn bar_length(&self, p: f64, max_proportion: f64, plot_extent: f64) -> f64 {
        let effective_max = if self.scale_height { max_proportion } else { 1.0 };
        let denominator = effective_max * self.hover_scale.max(1.0);
        if denominator > 0.0 {
            plot_extent * p / denominator
        } else {
            0.0
        }
    }
}

/// Distribution views that have a layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    #[default]
    VerticalBar,
    HorizontalBar,
}

impl ChartKind {
    /// Every kind, in selector order.
    pub const ALL: [ChartKind; 2] = [ChartKind::VerticalBar, ChartKind::HorizontalBar];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::VerticalBar => "Bar Chart",
            ChartKind::HorizontalBar => "Horizontal Bar Chart",
        }
    }

    /// Whether a kind selector is worth showing.
    pub fn selector_visible() -> bool {
        Self::ALL.len() >= 2
    }
}

/// Axis-aligned rectangle in chart coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub value: String,
    pub proportion: f64,
    pub rect: Rect,
}

/// Computed geometry of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub kind: ChartKind,
    pub width: f64,
    pub height: f64,
    pub bars: Vec<Bar>,
    pub baseline: Rect,
}

impl ChartLayout {
    /// Lay out `(value, proportion)` pairs in order.
    pub fn compute(kind: ChartKind, config: &BarChartConfig, values: &[(String, f64)]) -> Self {
        match kind {
            ChartKind::VerticalBar => vertical(config, values),
            ChartKind::HorizontalBar => horizontal(config, values),
        }
    }

    /// Largest bar extent along the value axis.
    pub fn tallest(&self) -> f64 {
        self.bars
            .iter()
            .map(|b| match self.kind {
                ChartKind::VerticalBar => b.rect.height,
                ChartKind::HorizontalBar => b.rect.width,
            })
            .fold(0.0, f64::max)
    }
}

fn max_proportion(values: &[(String, f64)]) -> f64 {
    values.iter().map(|(_, p)| *p).fold(0.0, f64::max)
}

fn vertical(config: &BarChartConfig, values: &[(String, f64)]) -> ChartLayout {
    let count = values.len();
    let bar_width = config.bar_thickness(count, config.max_width);
    let plot_width = bar_width * (count as f64 + config.bar_padding * (count.max(1) as f64 - 1.0));
    let plot_height = config.total_height - config.line_width;
    let max = max_proportion(values);

    let bars = values
        .iter()
        .enumerate()
        .map(|(i, (value, p))| {
            let height = config.bar_length(*p, max, plot_height);
            Bar {
                value: value.clone(),
                proportion: *p,
                rect: Rect {
                    x: i as f64 * bar_width * (1.0 + config.bar_padding),
                    y: plot_height - height,
                    width: bar_width,
                    height,
                },
            }
        })
        .collect();

    ChartLayout {
        kind: ChartKind::VerticalBar,
        width: plot_width,
        height: config.total_height,
        bars,
        baseline: Rect {
            x: 0.0,
            y: plot_height,
            width: plot_width,
            height: config.line_width,
        },
    }
}

fn horizontal(config: &BarChartConfig, values: &[(String, f64)]) -> ChartLayout {
    let count = values.len();
    let bar_height = config.bar_thickness(count, config.total_height);
    let plot_height = bar_height * (count as f64 + config.bar_padding * (count.max(1) as f64 - 1.0));
    let total_width = if config.max_width > 0.0 {
        config.max_width
    } else {
        config.total_height
    };
    let plot_width = total_width - config.line_width;
    let max = max_proportion(values);

    let bars = values
        .iter()
        .enumerate()
        .map(|(i, (value, p))| Bar {
            value: value.clone(),
            proportion: *p,
            rect: Rect {
                x: config.line_width,
                y: i as f64 * bar_height * (1.0 + config.bar_padding),
                width: config.bar_length(*p, max, plot_width),
                height: bar_height,
            },
        })
        .collect();

    ChartLayout {
        kind: ChartKind::HorizontalBar,
        width: total_width,
        height: plot_height,
        bars,
        baseline: Rect {
            x: 0.0,
            y: 0.0,
            width: config.line_width,
            height: plot_height,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(ps: &[f64]) -> Vec<(String, f64)> {
        ps.iter().enumerate().map(|(i, p)| (format!("v{}", i), *p)).collect()
    }

    #[test]
    fn test_default_width_when_room() {
        let layout = ChartLayout::compute(ChartKind::VerticalBar, &BarChartConfig::default(), &values(&[0.5, 0.5]));
        assert_eq!(layout.bars[0].rect.width, 20.0);
        assert!((layout.bars[1].rect.x - 24.0).abs() < 1e-9);
        assert!((layout.width - 44.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_shrinks_to_fit() {
        let config = BarChartConfig::default();
        let layout = ChartLayout::compute(ChartKind::VerticalBar, &config, &values(&[0.1; 20]));
        let expected = 200.0 / (20.0 + 0.2 * 19.0);
        assert!((layout.bars[0].rect.width - expected).abs() < 1e-9);
        assert!(layout.width <= config.max_width + 1e-9);
    }

    #[test]
    fn test_scaled_heights_leave_hover_margin() {
        let config = BarChartConfig::default();
        let layout = ChartLayout::compute(ChartKind::VerticalBar, &config, &values(&[0.2, 0.6, 0.2]));
        let plot_height = config.total_height - config.line_width;
        assert!((layout.tallest() * config.hover_scale - plot_height).abs() < 1e-9);
        assert!((layout.bars[0].rect.height * 3.0 - layout.bars[1].rect.height).abs() < 1e-9);
        let bar = &layout.bars[1].rect;
        assert!((bar.y + bar.height - plot_height).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_scale_heights() {
        let config = BarChartConfig::default().with_scale_height(false);
        let layout = ChartLayout::compute(ChartKind::VerticalBar, &config, &values(&[0.5]));
        let expected = (config.total_height - config.line_width) * 0.5 / config.hover_scale;
        assert!((layout.bars[0].rect.height - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_distribution_has_flat_bars() {
        let layout = ChartLayout::compute(ChartKind::VerticalBar, &BarChartConfig::default(), &values(&[0.0, 0.0]));
        assert!(layout.bars.iter().all(|b| b.rect.height == 0.0));
    }

    #[test]
    fn test_horizontal_is_transposed() {
        let config = BarChartConfig::default();
        let layout = ChartLayout::compute(ChartKind::HorizontalBar, &config, &values(&[0.25, 0.75]));
        assert_eq!(layout.bars[0].rect.height, 20.0);
        let plot_width = config.max_width - config.line_width;
        assert!((layout.tallest() * config.hover_scale - plot_width).abs() < 1e-9);
    }
}
