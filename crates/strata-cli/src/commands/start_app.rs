//! Implementation of the `strata start-app` command.

use std::io::IsTerminal as _;

use tracing::{debug, instrument};

use strata_adapters::PlaceholderRenderer;
use strata_core::application::{AppTemplateService, StartAppReport, StartAppRequest};

use crate::{
    cli::{GlobalArgs, StartAppArgs},
    commands::Project,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `strata start-app` command.
///
/// 1. Resolve the template (explicit path, named, or the configured default)
/// 2. Confirm before replacing an existing app unless `--yes`
/// 3. Render and copy via [`AppTemplateService`]
/// 4. Report files, directories and the settings edit
#[instrument(skip_all, fields(app = %args.name))]
pub fn execute(
    args: StartAppArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = Project::open(&global)?;
    let template = args
        .template
        .clone()
        .unwrap_or_else(|| config.templates.default.clone());
    let dest_dir = args.dir.clone().unwrap_or_default();

    let existing = project.root().join(&dest_dir).join(&args.name);
    if args.force && !args.dry_run && !args.yes && existing.is_dir() && prompt_allowed(&output) {
        let question = format!("Replace existing directory '{}'?", existing.display());
        if !confirm(&question)? {
            return Err(CliError::Cancelled);
        }
    }

    let service = AppTemplateService::new(
        project.template_store(&config, args.template_path.as_deref()),
        Box::new(PlaceholderRenderer::new()),
        project.filesystem(),
        project.root(),
    );
    let settings = project.settings(&config);

    debug!(template = %template, dest = %dest_dir.display(), "Starting app");
    let report = service.start_app(
        StartAppRequest {
            name: args.name,
            template,
            dest_dir,
            force: args.force,
            add_to_settings: args.add_to_settings,
            dry_run: args.dry_run,
        },
        Some(&settings),
    )?;

    if output.is_json() {
        output.json(&report)?;
    } else {
        render(&report, &output)?;
    }
    Ok(())
}

fn render(report: &StartAppReport, output: &OutputManager) -> CliResult<()> {
    let app = report.app.as_str();
    if report.dry_run {
        output.header(&format!(
            "Dry run: would create app '{app}' from template '{}'",
            report.template
        ))?;
        output.changes(&report.changes, true)?;
    } else {
        if report.replaced {
            output.warning(&format!(
                "Replaced existing directory {}",
                report.destination.display()
            ))?;
        }
        output.success(&format!(
            "App '{app}' created at {} ({} files, {} directories)",
            report.destination.display(),
            report.files,
            report.directories
        ))?;
    }

    if let Some(edit) = &report.settings {
        let prefix = if report.dry_run { "Would update" } else { "Updated" };
        if edit.outcome.is_change() {
            output.info(&format!(
                "{prefix} {}: '{}' {}",
                edit.list, edit.key, edit.outcome
            ))?;
        } else {
            output.info(&format!("{}: '{}' {}", edit.list, edit.key, edit.outcome))?;
        }
    }

    if !report.dry_run && !output.is_quiet() {
        output.print("")?;
        output.print("Next steps:")?;
        if !report.registered {
            output.print(&format!("  strata manage-project-app {app}"))?;
        }
        output.print(&format!(
            "  strata manage-file {app} --layer controllers --suffix {app}"
        ))?;
    }
    Ok(())
}

/// Prompts need a terminal on both ends and a human reading the output.
fn prompt_allowed(output: &OutputManager) -> bool {
    std::io::stdin().is_terminal() && !output.is_json() && !output.is_quiet()
}

#[cfg(feature = "interactive")]
fn confirm(question: &str) -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(std::io::Error::from)
        .with_cli_context(|| "failed to read confirmation")
}

#[cfg(not(feature = "interactive"))]
fn confirm(question: &str) -> CliResult<bool> {
    use std::io::{self, Write};

    print!("{question} [y/N] ");
    io::stdout()
        .flush()
        .with_cli_context(|| "failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .with_cli_context(|| "failed to read confirmation input")?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input == "y" || input == "yes")
}
