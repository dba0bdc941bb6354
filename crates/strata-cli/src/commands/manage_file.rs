//! Implementation of the `strata manage-file` command.

use tracing::instrument;

use strata_core::{
    application::{
        CleanupReport, CleanupRequest, CreateFileRequest, FilePlan, ScaffoldService, ToggleReport,
        ToggleRequest,
    },
    domain::{DomainValidator, ImportOutcome},
    error::StrataError,
};

use crate::{
    cli::{GlobalArgs, ManageFileArgs},
    commands::Project,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// What one invocation does, picked from the action flags.
enum Action {
    Create { suffix: String },
    Toggle { suffix: String },
    Cleanup,
}

#[instrument(skip_all, fields(app = %args.app, layer = %args.layer))]
pub fn execute(
    args: ManageFileArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let action = action(&args)?;
    let project = Project::open(&global)?;
    let service = ScaffoldService::new(
        project.filesystem(),
        config.layers.catalog(),
        project.root(),
    );

    match action {
        Action::Create { suffix } => {
            let plan = service.create_file(CreateFileRequest {
                app: args.app,
                layer: args.layer,
                suffix,
                scope: args.scope,
                description: args.description,
                overwrite: args.force,
                dry_run: args.dry_run,
            })?;
            if output.is_json() {
                output.json(&plan)?;
            } else {
                render_create(&plan, &output)?;
            }
        }
        Action::Toggle { suffix } => {
            let report = service.toggle(ToggleRequest {
                app: args.app,
                layer: args.layer,
                suffix,
                scope: args.scope,
                enable: args.enable,
                disable: args.disable,
                dry_run: args.dry_run,
            })?;
            if output.is_json() {
                output.json(&report)?;
            } else {
                render_toggle(&report, &output)?;
            }
        }
        Action::Cleanup => {
            let report = service.cleanup(CleanupRequest {
                app: args.app,
                layer: args.layer,
                suffix: args.suffix,
                scope: args.scope,
                dry_run: args.dry_run,
            })?;
            if output.is_json() {
                output.json(&report)?;
            } else {
                render_cleanup(&report, &output)?;
            }
        }
    }
    Ok(())
}

fn action(args: &ManageFileArgs) -> CliResult<Action> {
    DomainValidator::exclusive_flags(&[
        ("--enable", args.enable),
        ("--disable", args.disable),
        ("--cleanup", args.cleanup),
    ])
    .map_err(StrataError::from)?;

    if args.cleanup {
        return Ok(Action::Cleanup);
    }
    let suffix = args.suffix.clone().ok_or_else(|| CliError::InvalidInput {
        message: "--suffix is required unless --cleanup is given".into(),
        source: None,
    })?;
    if args.enable || args.disable {
        Ok(Action::Toggle { suffix })
    } else {
        Ok(Action::Create { suffix })
    }
}

fn render_create(plan: &FilePlan, output: &OutputManager) -> CliResult<()> {
    if plan.dry_run {
        output.header(&format!("Dry run: would create {}", plan.path.display()))?;
    } else {
        output.success(&format!("Created {}", plan.path.display()))?;
    }
    output.changes(&plan.changes, plan.dry_run)?;
    if plan.import_outcome == ImportOutcome::PresentDisabled {
        output.warning(&format!(
            "'{}' is commented out in its __init__.py; run with --enable to activate it",
            plan.import
        ))?;
    }
    Ok(())
}

fn render_toggle(report: &ToggleReport, output: &OutputManager) -> CliResult<()> {
    let message = format!(
        "{} in {}: {}",
        report.import,
        report.aggregator.display(),
        report.outcome
    );
    if !report.outcome.is_change() {
        output.info(&message)?;
    } else if report.dry_run {
        output.header(&format!("Dry run: {message}"))?;
    } else {
        output.success(&message)?;
    }
    Ok(())
}

fn render_cleanup(report: &CleanupReport, output: &OutputManager) -> CliResult<()> {
    if report.changes.is_empty() {
        output.info("Nothing to clean up")?;
        return Ok(());
    }
    let summary = format!(
        "{} file(s) and {} empty scope(s)",
        report.removed_files.len(),
        report.removed_scopes.len()
    );
    if report.dry_run {
        output.header(&format!("Dry run: would remove {summary}"))?;
    } else {
        output.success(&format!("Removed {summary}"))?;
    }
    output.changes(&report.changes, report.dry_run)?;
    Ok(())
}
