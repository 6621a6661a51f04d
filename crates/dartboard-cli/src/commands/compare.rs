//! Compare command - run a comparison and show the similarity levels.

use colored::Colorize;
use dartboard::{DashboardConfig, FormState};

use super::render::print_levels;
use super::{connect, read_form, runtime, CommandResult};

pub fn run(form: &str, no_wait: bool, json: bool, config: DashboardConfig) -> CommandResult {
    let form = read_form(form)?;
    runtime()?.block_on(compare(form, no_wait, json, config))
}

async fn compare(
    form: FormState,
    no_wait: bool,
    json: bool,
    config: DashboardConfig,
) -> CommandResult {
    let mut dashboard = connect(config).await?;

    if no_wait {
        let (_, job_id) = dashboard.submit_filters(&form).await?;
        if json {
            println!("{}", serde_json::json!({ "job_id": job_id }));
        } else {
            println!("{} {}", "Submitted filter processing job".green(), job_id);
        }
        return Ok(());
    }

    let outcome = dashboard.compare(&form).await?;
    let buckets = dashboard.view().level_buckets(dashboard.session());
    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
    } else {
        println!(
            "{} {} results in {} levels (jobs {} and {})",
            "Compared:".green().bold(),
            outcome.ingest.new_entries.len(),
            buckets.len(),
            outcome.filter_job.job_id,
            outcome.similarity_job.job_id
        );
        println!();
        print_levels(&buckets);
    }
    Ok(())
}
