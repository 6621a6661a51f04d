//! Filters command - show the filters a form produces.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use colored::Colorize;
use dartboard::{AttributeConfig, DashboardConfig, HttpBackend, Session};

use super::{read_form, runtime, CommandResult};

pub fn run(
    form: &str,
    compare: bool,
    details: Option<PathBuf>,
    config: DashboardConfig,
) -> CommandResult {
    let form = read_form(form)?;

    let session = match details {
        Some(path) => {
            let file = File::open(&path)
                .map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;
            let details: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
            Session::new(config, AttributeConfig::from_details(&details)?)?
        }
        None => {
            let backend = HttpBackend::new(&config)?;
            runtime()?.block_on(Session::bootstrap(config, &backend))?
        }
    };

    let filters = session.filter_model().process_filters(&form)?;
    if compare {
        filters.validate_for_comparison()?;
    }

    if filters.active_attributes.is_empty() {
        eprintln!("{}", "No dataset attributes constrained.".yellow());
    }
    println!("{}", serde_json::to_string_pretty(&filters.to_wire())?);
    Ok(())
}
