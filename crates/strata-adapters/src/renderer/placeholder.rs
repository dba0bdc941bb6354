//! `{{TOKEN}}` substitution renderer.

use strata_core::{
    application::ports::TemplateRenderer,
    domain::{AppTemplate, DomainValidator as validator, ProjectStructure, RenderContext},
    error::StrataResult,
};
use tracing::{debug, instrument};

/// Replaces `{{TOKEN}}` placeholders in paths and text files.
///
/// Unknown tokens are left as written; binary files are copied verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    #[instrument(skip_all, fields(template = template.name()))]
    fn render(&self, template: &AppTemplate, context: &RenderContext) -> StrataResult<ProjectStructure> {
        validator::validate_template(template)?;
        let structure = template.render(context)?;
        validator::validate_structure(&structure)?;
        debug!(entries = structure.entry_count(), "Template rendered");
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::{AppName, FsEntry, TemplateContent, TemplateSource};

    fn file<'a>(structure: &'a ProjectStructure, path: &str) -> &'a [u8] {
        structure
            .files()
            .find(|f| f.path.to_slash() == path)
            .map(|f| f.content.as_slice())
            .unwrap_or_else(|| panic!("missing {path}"))
    }

    #[test]
    fn substitutes_paths_and_text_but_not_binary() {
        let template = AppTemplate::new("default", TemplateSource::Builtin)
            .with_directory("{{app_name}}_tests")
            .with_file(
                "{{app_name}}_views.py",
                TemplateContent::Text("from {{app_name}}.models import {{APP_CLASS_NAME}}\n".into()),
            )
            .with_file("logo.bin", TemplateContent::Binary(b"{{app_name}}\0".to_vec()));
        let app = AppName::parse("blog_post").unwrap();

        let structure = PlaceholderRenderer::new()
            .render(&template, &RenderContext::for_app(&app))
            .unwrap();

        assert_eq!(
            file(&structure, "blog_post_views.py"),
            b"from blog_post.models import BlogPost\n"
        );
        assert_eq!(file(&structure, "logo.bin"), b"{{app_name}}\0");
        assert!(structure.entries().any(
            |e| matches!(e, FsEntry::Directory(d) if d.path.to_slash() == "blog_post_tests")
        ));
    }

    #[test]
    fn empty_template_is_rejected() {
        let template = AppTemplate::new("empty", TemplateSource::Builtin);
        let app = AppName::parse("blog").unwrap();
        let result = PlaceholderRenderer::new().render(&template, &RenderContext::for_app(&app));
        assert!(result.is_err());
    }
}
