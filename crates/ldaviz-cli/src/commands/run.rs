//! Run command implementation

use crate::cli::RunArgs;
use crate::commands::run_action;
use crate::output::OutputWriter;
use crate::output_types::CoordinateRow;
use anyhow::{bail, Result};
use ldaviz_workspace::{Action, ActionOptions, Workspace};

pub async fn execute(args: RunArgs, workspace: &Workspace, output: &OutputWriter) -> Result<()> {
    let action = args.action;

    if action.is_synchronous() {
        workspace.execute_action(action, ActionOptions::new()).await?;
        output.success(format!("{} done", action));
        return output.result(serde_json::json!({ "action": action }));
    }

    let mut options = ActionOptions::new();
    match (action, args.target) {
        (Action::SwitchDirectory, Some(target)) => options = options.with_directory(target),
        (Action::SwitchDirectory, None) => bail!("switch-directory needs --target <DIR>"),
        (_, Some(_)) => bail!("--target only applies to switch-directory"),
        (_, None) => {}
    }

    let run = run_action(workspace, action, options, output).await?;
    output.success(format!("{}: {}", action, run.completion.status));

    if matches!(action, Action::LoadCoordinates | Action::CalculateCoordinates) {
        if let Some(coordinates) = workspace.coordinate_matrix() {
            output.table(&CoordinateRow::collect(&workspace.configurations(), &coordinates));
        }
    }

    output.result(run)
}
