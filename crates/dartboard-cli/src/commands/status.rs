//! Status command - show page and dataset loading status.

use colored::Colorize;
use dartboard::{DashboardConfig, HttpBackend, JobBackend};

use super::{runtime, CommandResult};

pub fn run(json_output: bool, config: DashboardConfig) -> CommandResult {
    let backend = HttpBackend::new(&config)?;
    let (page, loading) = runtime()?.block_on(async {
        let page = backend.page_status().await?;
        let loading = backend.loading_status().await?;
        Ok::<_, dartboard::DartboardError>((page, loading))
    })?;

    if json_output {
        let status = serde_json::json!({
            "backend": config.base_url,
            "page": page,
            "loading": loading,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{} {}", "Status for".cyan().bold(), config.base_url.white());
    println!();
    println!(
        "Page:     {}",
        page.status.as_deref().unwrap_or("unknown").white().bold()
    );
    if let Some(progress) = page.progress_value() {
        println!("Progress: {}", progress);
    }
    println!();

    println!("{}", "Loading:".yellow().bold());
    if loading.is_empty() {
        println!("  {}", "no steps reported".dimmed());
    }
    for (step, done) in &loading {
        let mark = if *done { "done".green() } else { "pending".yellow() };
        println!("  {:<24} {}", step, mark);
    }
    Ok(())
}
