//! Pipeline command implementation

use crate::cli::PipelineArgs;
use crate::commands::run_action;
use crate::output::OutputWriter;
use crate::output_types::{CoordinateRow, PipelineOutput};
use anyhow::{anyhow, bail, Result};
use ldaviz_workspace::{Action, ActionOptions, Workspace};

pub async fn execute(args: PipelineArgs, workspace: &Workspace, output: &OutputWriter) -> Result<()> {
    run_action(workspace, Action::CollectMetadata, ActionOptions::new(), output).await?;
    let configurations = workspace.configurations();
    if configurations.is_empty() {
        bail!("No configurations with topic data in this workspace");
    }

    let saved = workspace.storage().matrices.recorded_counts().await?.distances;
    let distances = match saved {
        Some(size) if !args.force && size == configurations.len() => Action::LoadDistances,
        Some(size) if !args.force => {
            output.warning(format!(
                "Saved distance matrix covers {} configurations but the workspace has {}; recalculating",
                size,
                configurations.len()
            ));
            Action::CalculateDistances
        }
        _ => Action::CalculateDistances,
    };
    tracing::debug!(%distances, saved = ?saved, force = args.force, "Chose distance source");
    run_action(workspace, distances, ActionOptions::new(), output).await?;

    let matrix = workspace
        .distance_matrix()
        .ok_or_else(|| anyhow!("No distance matrix after {}", distances))?;

    run_action(workspace, Action::CalculateCoordinates, ActionOptions::new(), output).await?;
    let coordinates = workspace
        .coordinate_matrix()
        .ok_or_else(|| anyhow!("No coordinates after {}", Action::CalculateCoordinates))?;

    let rows = CoordinateRow::collect(&configurations, &coordinates);
    output.section("Coordinates");
    output.table(&rows);
    output.success(format!(
        "Projected {} configurations (largest distance {:.4})",
        rows.len(),
        matrix.max_distance()
    ));

    output.result(PipelineOutput {
        configurations: configurations.len(),
        max_distance: matrix.max_distance(),
        coordinates: rows,
    })
}
