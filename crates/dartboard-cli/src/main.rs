//! Dartboard CLI - subgroup similarity from the terminal.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dartboard::DashboardConfig;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli::parse_log_level(&cli.log_level))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {}", e);
    }

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::Filters {
            form,
            compare,
            details,
        } => commands::filters::run(&form, compare, details, config),

        Commands::Compare {
            form,
            no_wait,
            json,
        } => commands::compare::run(&form, no_wait, json, config),

        Commands::Results { level, entry, json } => {
            commands::results::run(level, entry, json, config)
        }

        Commands::Palette {
            count,
            spec,
            continuous,
        } => commands::palette::run(count, spec, continuous, &config),

        Commands::Status { json } => commands::status::run(json, config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> commands::CommandResult<DashboardConfig> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    let config = config.with_env_overrides();
    let config = match &cli.url {
        Some(url) => config.with_base_url(url.as_str()),
        None => config,
    };
    config.validate()?;
    Ok(config)
}
