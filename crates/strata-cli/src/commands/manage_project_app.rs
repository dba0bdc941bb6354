//! Implementation of the `strata manage-project-app` command.

use tracing::instrument;

use strata_core::{
    application::SettingsEdit,
    domain::{SettingsCategory, SettingsOp},
    error::StrataError,
};

use crate::{
    cli::{GlobalArgs, ManageProjectAppArgs},
    commands::Project,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(app = %args.app, kind = ?args.kind))]
pub fn execute(
    args: ManageProjectAppArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let op = SettingsOp::from_flags(args.remove, args.soft_remove, args.restore, args.comment)
        .map_err(StrataError::from)?;
    let category = SettingsCategory::from(args.kind);

    let project = Project::open(&global)?;
    let edit = project
        .settings(&config)
        .edit(category, &args.app, &op, args.force, args.dry_run)?;

    if output.is_json() {
        output.json(&edit)?;
    } else {
        render(&edit, &output)?;
    }
    Ok(())
}

fn render(edit: &SettingsEdit, output: &OutputManager) -> CliResult<()> {
    let message = format!(
        "'{}' {} in {} ({})",
        edit.key,
        edit.outcome,
        edit.list,
        edit.path.display()
    );
    if !edit.outcome.is_change() {
        output.info(&message)?;
    } else if edit.dry_run {
        output.header(&format!("Dry run: {message}"))?;
    } else {
        output.success(&message)?;
    }
    Ok(())
}
