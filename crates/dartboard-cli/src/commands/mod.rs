//! CLI command implementations.

pub mod compare;
pub mod filters;
pub mod palette;
pub mod render;
pub mod results;
pub mod status;

use std::io::Read;
use std::sync::Arc;

use colored::Colorize;
use dartboard::job::PageStatus;
use dartboard::{Dashboard, DashboardConfig, FormState, HttpBackend};

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Read a form body from the argument, or from stdin for `-`.
pub fn read_form(arg: &str) -> CommandResult<FormState> {
    let body = if arg == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        body
    } else {
        arg.to_string()
    };
    Ok(FormState::from_urlencoded(body.trim())?)
}

pub fn runtime() -> CommandResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Wait for the backend's dataset and build a dashboard over HTTP.
pub async fn connect(config: DashboardConfig) -> CommandResult<Dashboard<HttpBackend>> {
    let backend = Arc::new(HttpBackend::new(&config)?);
    let (dashboard, report) = Dashboard::load(config, backend).await?;
    tracing::info!(checks = report.checks(), "dataset loaded");
    Ok(dashboard.with_status_sink(Arc::new(print_progress)))
}

fn print_progress(message: &str, status: &PageStatus) {
    match status.progress_value() {
        Some(progress) => eprintln!("{} ({})", message.cyan(), progress),
        None => eprintln!("{}...", message.cyan()),
    }
}
