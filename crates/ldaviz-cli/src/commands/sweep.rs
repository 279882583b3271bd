//! Sweep command implementation

use crate::cli::SweepArgs;
use crate::commands::generate::run_generation;
use crate::commands::run_action;
use crate::output::OutputWriter;
use crate::output_types::{ConfigurationRow, SweepOutput};
use anyhow::{Context, Result};
use ldaviz_workspace::{Action, ActionOptions, ParameterSweep, Workspace};

pub async fn execute(args: SweepArgs, workspace: &Workspace, output: &OutputWriter) -> Result<()> {
    let sweep = ParameterSweep::new(args.kappa, args.alpha, args.eta);
    let grid = sweep.expand().context("Invalid parameter sweep")?;

    let options = ActionOptions::new().with_sweep(sweep);
    run_action(workspace, Action::GenerateParameterList, options, output).await?;

    let rows: Vec<ConfigurationRow> = grid.iter().map(ConfigurationRow::from).collect();
    output.section("Parameter List");
    output.table(&rows);
    output.success(format!("Stored {} configurations", rows.len()));

    if args.generate {
        run_generation(workspace, output).await?;
    }

    output.result(SweepOutput { configurations: rows, generated: args.generate })
}
