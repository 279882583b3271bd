//! Compare command implementation

use crate::cli::CompareArgs;
use crate::commands::run_action;
use crate::output::OutputWriter;
use crate::output_types::CompareOutput;
use anyhow::{anyhow, Result};
use ldaviz_core::models::ConfigurationId;
use ldaviz_numeric::{topic_distance_matrix, DistanceEngine};
use ldaviz_workspace::{Action, ActionOptions, Workspace};

pub async fn execute(args: CompareArgs, workspace: &Workspace, output: &OutputWriter) -> Result<()> {
    run_action(workspace, Action::LoadRawData, ActionOptions::new(), output).await?;

    let datasets = workspace.datasets();
    let lookup = |id: u32| {
        datasets
            .get(&ConfigurationId(id))
            .ok_or_else(|| anyhow!("Configuration {} has no topic data", id))
    };
    let first = lookup(args.first)?;
    let second = lookup(args.second)?;

    let settings = workspace.settings();
    let engine = DistanceEngine::new(settings.metric, settings.aggregation);
    let distance = engine.dataset_distance(first, second)?;
    let grid = topic_distance_matrix(settings.metric, first, second)?;

    output.section(format!("Configuration {} vs {}", args.first, args.second));
    output.kv("Metric", settings.metric);
    output.kv("Aggregation", settings.aggregation);
    output.kv("Distance", format!("{:.6}", distance));

    let columns: Vec<String> = second.topics.iter().map(|t| format!("{}:{}", args.second, t.index)).collect();
    let rows: Vec<(String, Vec<f64>)> = first
        .topics
        .iter()
        .zip(&grid)
        .map(|(t, row)| (format!("{}:{}", args.first, t.index), row.clone()))
        .collect();
    output.section("Topic Distances");
    output.grid("topic", &columns, &rows);

    output.result(CompareOutput {
        first: args.first,
        second: args.second,
        metric: settings.metric.to_string(),
        aggregation: settings.aggregation.to_string(),
        distance,
        topic_distances: grid,
    })
}
