//! Generate command implementation

use crate::commands::run_action;
use crate::output::OutputWriter;
use crate::output_types::GenerateOutput;
use anyhow::Result;
use ldaviz_workspace::{Action, ActionOptions, TaskStatus, Workspace};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// How long to wait for metadata collection after generation
const FOLLOW_UP_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn execute(workspace: &Workspace, output: &OutputWriter) -> Result<()> {
    let result = run_generation(workspace, output).await?;
    output.result(result)
}

/// Run the generator, then wait for the metadata collection it triggers
pub(crate) async fn run_generation(workspace: &Workspace, output: &OutputWriter) -> Result<GenerateOutput> {
    let mut events = workspace.subscribe();
    let run = run_action(workspace, Action::GenerateData, ActionOptions::new(), output).await?;

    let generated = match run.completion.status {
        TaskStatus::Completed { items } => items,
        _ => 0,
    };

    let follow_up = tokio::time::timeout(FOLLOW_UP_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(event) if event.action == Action::CollectMetadata => return Some(event),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten();

    let collected = match follow_up.map(|event| event.status) {
        Some(TaskStatus::Completed { items }) => {
            output.success(format!("Generated data for {} configurations, {} readable", generated, items));
            Some(items)
        }
        Some(status) => {
            output.warning(format!("Reading the generated data: {}", status));
            None
        }
        None => {
            output.warning("Timed out waiting for the generated data to be collected");
            None
        }
    };

    Ok(GenerateOutput { generated, collected })
}
