//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dartboard: compare subgroups of a dataset and browse their similarity
#[derive(Parser)]
#[command(name = "dartboard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend root URL (overrides the config file and DARTBOARD_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn a urlencoded filter form into the filters sent to the backend
    Filters {
        /// Urlencoded form body, or "-" to read it from stdin
        #[arg(value_name = "FORM")]
        form: String,

        /// Require both subgroups to be defined
        #[arg(long)]
        compare: bool,

        /// Dataset details JSON to use instead of asking the backend
        #[arg(long, value_name = "FILE")]
        details: Option<PathBuf>,
    },

    /// Run a comparison and show the resulting similarity levels
    Compare {
        /// Urlencoded form body, or "-" to read it from stdin
        #[arg(value_name = "FORM")]
        form: String,

        /// Submit filter processing and exit without waiting
        #[arg(long)]
        no_wait: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the backend's current similarity results
    Results {
        /// Level to show (default: the first level received)
        #[arg(short, long)]
        level: Option<usize>,

        /// Open the detail panel for this result index
        #[arg(short, long, value_name = "IDX")]
        entry: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview palette colors with their legible text color
    Palette {
        /// Number of categories to color
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// Palette spec (default: the configured categorical palette)
        #[arg(long)]
        spec: Option<String>,

        /// Show colorbar ticks of the similarity palette instead
        #[arg(long, conflicts_with_all = ["count", "spec"])]
        continuous: bool,
    },

    /// Show page and dataset loading status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Map a `--log-level` value to a tracing level, falling back to warn.
pub fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    }
}
