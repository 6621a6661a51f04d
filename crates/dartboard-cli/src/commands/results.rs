//! Results command - browse the backend's current similarity results.

use dartboard::view::{DetailPanel, LevelBucket};
use dartboard::DashboardConfig;
use serde::Serialize;

use super::render::{print_detail, print_levels};
use super::{connect, runtime, CommandResult};

#[derive(Serialize)]
struct ResultsOutput<'a> {
    levels: Vec<LevelBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a DetailPanel>,
}

pub fn run(
    level: Option<usize>,
    entry: Option<usize>,
    json: bool,
    config: DashboardConfig,
) -> CommandResult {
    runtime()?.block_on(results(level, entry, json, config))
}

async fn results(
    level: Option<usize>,
    entry: Option<usize>,
    json: bool,
    config: DashboardConfig,
) -> CommandResult {
    let mut dashboard = connect(config).await?;
    dashboard.refresh_results().await?;

    if let Some(level) = level {
        dashboard.view_mut().select_level(level)?;
    }
    if let Some(raw_index) = entry {
        dashboard.activate(raw_index).await?;
    }

    let view = dashboard.view();
    let output = ResultsOutput {
        levels: view.level_buckets(dashboard.session()),
        detail: view.detail(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_levels(&output.levels);
        if let Some(panel) = output.detail {
            println!();
            print_detail(panel, &view.visible_cards());
        }
    }
    Ok(())
}
