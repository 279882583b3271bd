//! Command implementations

mod compare;
mod generate;
mod pipeline;
mod run;
mod status;
mod sweep;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use crate::progress::{bar_sink, create_progress_bar, finish_error, finish_success};
use anyhow::{anyhow, bail, Context, Result};
use ldaviz_core::config::{CliConfigOverrides, LayeredConfig};
use ldaviz_workspace::{Action, ActionOptions, Completion, TaskStatus, Workspace, WorkspaceSettings};

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let overrides = CliConfigOverrides {
        metric: cli.metric,
        aggregation: cli.aggregation,
        backend: cli.backend,
        generator_command: cli.generator.clone(),
    };
    let config = LayeredConfig::for_directory(&cli.dir, overrides)
        .with_context(|| format!("Failed to load configuration for {}", cli.dir.display()))?;
    let settings = WorkspaceSettings::from_config(&config).context("Invalid configuration")?;
    let workspace = Workspace::open(cli.dir.clone(), settings)
        .await
        .with_context(|| format!("Cannot open workspace {}", cli.dir.display()))?;
    tracing::debug!(
        dir = %cli.dir.display(),
        backend = ?config.backend.value,
        metric = ?config.metric.value,
        aggregation = ?config.aggregation.value,
        "Workspace opened"
    );

    match cli.command {
        Commands::Status(args) => status::execute(args, &workspace, &config, &output).await,
        Commands::Run(args) => run::execute(args, &workspace, &output).await,
        Commands::Pipeline(args) => pipeline::execute(args, &workspace, &output).await,
        Commands::Sweep(args) => sweep::execute(args, &workspace, &output).await,
        Commands::Generate => generate::execute(&workspace, &output).await,
        Commands::Compare(args) => compare::execute(args, &workspace, &output).await,
    }
}

/// Dispatch `action` and wait for it without any output
pub(crate) async fn settle(workspace: &Workspace, action: Action) -> Result<Completion> {
    let handle = workspace
        .execute_action(action, ActionOptions::new())
        .await
        .with_context(|| format!("Cannot start {}", action))?
        .ok_or_else(|| anyhow!("{} has no task to wait for", action))?;
    Ok(handle.wait().await)
}

/// Dispatch `action` with a progress bar and report what ran
///
/// Fails when the requested action fails; a missing artifact is only a
/// warning.
pub(crate) async fn run_action(
    workspace: &Workspace,
    action: Action,
    options: ActionOptions,
    output: &OutputWriter,
) -> Result<RunOutput> {
    let mut events = workspace.subscribe();

    let bar = (!output.is_json()).then(|| create_progress_bar(&format!("Running {}", action)));
    let options = match &bar {
        Some(bar) => options.with_progress(bar_sink(bar.clone())),
        None => options,
    };

    let handle = workspace
        .execute_action(action, options)
        .await
        .with_context(|| format!("Cannot start {}", action))?
        .ok_or_else(|| anyhow!("{} has no task to wait for", action))?;
    let completion = handle.wait().await;
    tracing::debug!(
        task_id = %completion.task_id,
        %action,
        status = %completion.status,
        "Action finished"
    );

    // Everything published ahead of the requested action was chained in front of it
    let mut chained = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.task_id == completion.task_id {
            break;
        }
        chained.push(event);
    }

    for event in &chained {
        output.info(format!("{}: {}", event.action, event.status));
    }

    match &completion.status {
        TaskStatus::Completed { items } => {
            if let Some(bar) = &bar {
                finish_success(bar, &format!("{} ({} items)", action, items));
            }
        }
        TaskStatus::NotFound => {
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }
            output.warning(format!("{}: nothing saved yet", action));
        }
        TaskStatus::Failed { reason } => {
            if let Some(bar) = &bar {
                finish_error(bar, &format!("{} failed", action));
            }
            bail!("{} failed: {}", action, reason);
        }
    }

    Ok(RunOutput { completion, chained })
}
