//! Color encoding for categories and similarity magnitudes.

mod cache;
mod palette;
mod rgb;

pub use cache::ColorSetCache;
pub use palette::{build_palette, ColorMap, ColorSet, ColorStop, DEFAULT_TICK_STEP};
pub use rgb::{luminance, Foreground, Rgb, LUMINANCE_THRESHOLD};
