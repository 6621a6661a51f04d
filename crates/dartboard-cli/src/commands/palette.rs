//! Palette command - preview palette colors.

use colored::Colorize;
use dartboard::color::{ColorMap, DEFAULT_TICK_STEP};
use dartboard::DashboardConfig;

use super::render::swatch;
use super::CommandResult;

pub fn run(
    count: usize,
    spec: Option<String>,
    continuous: bool,
    config: &DashboardConfig,
) -> CommandResult {
    if continuous {
        let map = ColorMap::parse(&config.continuous_palette)?;
        println!("{} {}", "Similarity palette:".cyan().bold(), config.continuous_palette);
        for (tick, color) in map.colorbar_ticks(DEFAULT_TICK_STEP)? {
            let text = format!(" {:<5} {} ", tick, color.to_hex());
            println!("  {}", swatch(&text, color, color.foreground()));
        }
        return Ok(());
    }

    let spec = spec.unwrap_or_else(|| config.categorical_palette.clone());
    let map = ColorMap::parse(&spec)?;
    println!("{} {}", "Palette:".cyan().bold(), spec);
    for index in 0..count {
        let color = map.get_cat(index, count);
        let foreground = color.foreground();
        let text = format!(" {:>3} {} {:<5} ", index, color.to_hex(), foreground.css());
        println!("  {}", swatch(&text, color, foreground));
    }
    Ok(())
}
