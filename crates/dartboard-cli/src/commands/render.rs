//! Terminal rendering of level buckets and detail panels.

use colored::{ColoredString, Colorize};
use dartboard::color::{Foreground, Rgb};
use dartboard::view::{DetailCard, DetailPanel, DimensionHeader, EntryRow, LevelBucket};

/// Text on a colored background, with the legible foreground.
pub fn swatch(text: &str, background: Rgb, foreground: Foreground) -> ColoredString {
    let (r, g, b) = background.to_bytes();
    let text = match foreground {
        Foreground::Light => text.truecolor(255, 255, 255),
        Foreground::Dark => text.truecolor(0, 0, 0),
    };
    text.on_truecolor(r, g, b)
}

fn score(row: &EntryRow) -> ColoredString {
    let text = format!(" {:>7} ", row.display);
    match (row.background, row.foreground) {
        (Some(bg), Some(fg)) => swatch(&text, bg, fg),
        _ => text.normal(),
    }
}

pub fn print_levels(buckets: &[LevelBucket]) {
    if buckets.is_empty() {
        println!("{}", "No results.".yellow());
        return;
    }

    let levels: Vec<String> = buckets
        .iter()
        .map(|b| {
            let label = format!("{} ({})", b.level, b.len());
            if b.selected {
                format!("[{}]", label).cyan().bold().to_string()
            } else {
                label
            }
        })
        .collect();
    println!("{} {}", "Levels:".yellow().bold(), levels.join("  "));
    println!();

    for bucket in buckets.iter().filter(|b| b.selected) {
        for (group, rows) in &bucket.groups {
            if !group.is_empty() {
                println!("{}", group.dimmed());
            }
            for row in rows {
                let marker = if row.active { ">" } else { " " };
                println!("{} {:>4} {} {}", marker, row.raw_index, score(row), row.name);
            }
        }
    }
}

fn print_header(header: &DimensionHeader) {
    let text = format!(" {:<24} {:>7} ", header.display_name, header.display);
    println!("{}", swatch(&text, header.background, header.foreground));
}

/// Print a detail panel with the given cards.
pub fn print_detail(panel: &DetailPanel, cards: &[&DetailCard]) {
    println!("{} {}", "Entry".cyan().bold(), panel.raw_index);
    println!("{}", panel.name.white().bold());
    println!();

    for subgroup in &panel.subgroups {
        let size = subgroup
            .size
            .map(|n| format!(" (n={})", n))
            .unwrap_or_default();
        println!("  {:<11} {}{}", subgroup.label.yellow(), subgroup.name, size);
    }
    if let Some(overlap) = panel.overlap {
        println!("  {:<11} {}", "Overlap".yellow(), overlap);
    }
    println!();

    if let Some(overall) = &panel.overall {
        print_header(overall);
    }
    for card in cards {
        print_header(&card.header);
        let Some(distribution) = &card.distribution else {
            continue;
        };
        for (index, legend) in distribution.legend.iter().enumerate() {
            let key = match legend.color {
                Some(color) => swatch("  ", color, color.foreground()),
                None => "  ".normal(),
            };
            let left = distribution.proportions[0].get(index).map_or(0.0, |(_, p)| *p);
            let right = distribution.proportions[1].get(index).map_or(0.0, |(_, p)| *p);
            println!(
                "    {} {:<16} {:>6.1}% {:>6.1}%",
                key,
                legend.display_name,
                left * 100.0,
                right * 100.0
            );
        }
    }
}
