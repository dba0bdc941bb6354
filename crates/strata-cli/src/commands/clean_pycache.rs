//! Implementation of the `strata clean-pycache` command.

use strata_core::application::PycacheService;

use crate::{
    cli::{CleanPycacheArgs, GlobalArgs},
    commands::{Project, format_bytes},
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: CleanPycacheArgs, global: GlobalArgs, output: OutputManager) -> CliResult<()> {
    let project = Project::open(&global)?;
    let report = PycacheService::new(project.filesystem(), project.root()).clean(args.dry_run)?;

    if output.is_json() {
        output.json(&report)?;
        return Ok(());
    }

    if report.directories.is_empty() {
        output.info("No __pycache__ directories found")?;
        return Ok(());
    }
    for dir in &report.directories {
        output.print(&format!(
            "  {} ({})",
            dir.path.display(),
            format_bytes(dir.bytes)
        ))?;
    }
    let summary = format!(
        "{} __pycache__ director{}, {}",
        report.directories.len(),
        if report.directories.len() == 1 { "y" } else { "ies" },
        format_bytes(report.total_bytes)
    );
    if report.dry_run {
        output.header(&format!("Dry run: would remove {summary}"))?;
    } else {
        output.success(&format!("Removed {summary}"))?;
    }
    Ok(())
}
