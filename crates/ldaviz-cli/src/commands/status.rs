//! Status command implementation

use crate::cli::StatusArgs;
use crate::commands::settle;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigurationRow, StatusOutput};
use anyhow::{bail, Context, Result};
use ldaviz_core::config::LayeredConfig;
use ldaviz_core::models::ArtifactCounts;
use ldaviz_workspace::{Action, TaskStatus, Workspace};

pub async fn execute(
    args: StatusArgs,
    workspace: &Workspace,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let collected = settle(workspace, Action::CollectMetadata).await?;
    if let TaskStatus::Failed { reason } = collected.status {
        bail!("Cannot read configurations: {}", reason);
    }

    let storage = workspace.storage();
    let configurations = workspace.configurations();
    let parameter_list = storage
        .topics
        .load_parameter_list()
        .await
        .context("Failed to read the parameter list")?;

    let recorded = match storage.matrices.recorded_counts().await {
        Ok(recorded) => recorded,
        Err(e) => {
            output.warning(format!("Saved matrices are unreadable: {}", e));
            ArtifactCounts::default()
        }
    };
    let integrity = workspace.integrity_status().await;

    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let directory = workspace
        .directory()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    let describe = |count: Option<usize>| match count {
        Some(n) => format!("{} configurations", n),
        None => "not saved".to_string(),
    };

    output.section("Workspace Status");
    output.kv("Location", &directory);
    output.kv("Configurations", configurations.len());
    output.kv("Parameter List", parameter_list.len());

    output.section("Artifacts");
    output.kv("Distance Matrix", describe(recorded.distances));
    output.kv("Coordinate Matrix", describe(recorded.coordinates));
    output.kv("Integrity", integrity);

    output.section("Configuration");
    output.table(&entries);

    let rows: Vec<ConfigurationRow> = configurations.iter().map(ConfigurationRow::from).collect();
    if args.verbose {
        output.section("Configurations");
        output.table(&rows);
    } else if configurations.is_empty() {
        output.info("No configurations with topic data; run 'ldaviz sweep' and 'ldaviz generate'");
    }

    output.result(StatusOutput {
        directory,
        configurations: configurations.len(),
        parameter_list: parameter_list.len(),
        state: workspace.state(),
        distance_matrix: recorded.distances,
        coordinate_matrix: recorded.coordinates,
        integrity,
        config: entries,
        configuration_list: args.verbose.then_some(rows),
    })
}
