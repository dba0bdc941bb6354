//! Implementation of the `strata list-templates` command.

use strata_core::application::TemplateService;

use crate::{
    cli::{GlobalArgs, ListFormat, ListTemplatesArgs},
    commands::Project,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: ListTemplatesArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project = Project::open(&global)?;
    let service = TemplateService::new(project.template_store(&config, None));
    let templates = service.list()?;

    if output.is_json() {
        output.json(&templates)?;
        return Ok(());
    }

    match args.format {
        ListFormat::Table => {
            output.header("Available Templates:")?;
            let width = templates.iter().map(|t| t.name.len()).max().unwrap_or(0);
            for template in &templates {
                let default_marker = if template.name == config.templates.default {
                    " (default)"
                } else {
                    ""
                };
                output.print(&format!(
                    "  {:<width$}  {}{}",
                    template.name,
                    template.source,
                    default_marker
                ))?;
                if let Some(description) = &template.description {
                    output.print(&format!("  {:<width$}  {description}", ""))?;
                }
            }
        }
        ListFormat::List => {
            for template in &templates {
                output.print(&template.name)?;
            }
        }
        // Serialise as a JSON array even when the global format is not JSON.
        ListFormat::Json => output.json(&templates)?,
    }

    Ok(())
}
