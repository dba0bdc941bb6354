//! The template that ships with the binary.

use strata_core::{
    application::{ApplicationError, ports::TemplateStore},
    domain::{AppTemplate, TemplateContent, TemplateSource, TemplateSummary},
    error::StrataResult,
};

pub const DEFAULT_TEMPLATE: &str = "default";

/// Layer packages created in every new app.
const APP_LAYERS: &[&str] = &[
    "admin",
    "controllers",
    "filters",
    "handlers",
    "models",
    "permissions",
    "selectors",
    "serializers",
    "services",
    "urls",
];

const APPS_PY: &str = r#"from django.apps import AppConfig


class {{APP_CLASS_NAME}}Config(AppConfig):
    default_auto_field = "django.db.models.BigAutoField"
    name = "{{APP_NAME}}"
    verbose_name = "{{APP_CLASS_NAME}}"
"#;

const URLS_INIT: &str = r#""""
URL routes for {{APP_NAME}}.
"""

from django.urls import include, path  # noqa: F401

urlpatterns = []
"#;

const TESTS_CONFTEST: &str = r#"import pytest


@pytest.fixture
def api_client():
    from rest_framework.test import APIClient

    return APIClient()
"#;

/// Store holding the embedded `default` app template.
#[derive(Debug, Clone)]
pub struct BuiltinTemplateStore {
    templates: Vec<AppTemplate>,
}

impl BuiltinTemplateStore {
    pub fn new() -> Self {
        Self {
            templates: vec![default_app()],
        }
    }
}

impl Default for BuiltinTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn text(content: &str) -> TemplateContent {
    TemplateContent::Text(content.to_string())
}

/// A DRF app laid out one package per layer.
fn default_app() -> AppTemplate {
    let mut template = AppTemplate::new(DEFAULT_TEMPLATE, TemplateSource::Builtin)
        .with_description("Django REST app with one package per layer")
        .with_file("__init__.py", text(""))
        .with_file("apps.py", text(APPS_PY))
        .with_file("migrations/__init__.py", text(""))
        .with_file("tests/__init__.py", text(""))
        .with_file("tests/conftest.py", text(TESTS_CONFTEST));
    for layer in APP_LAYERS {
        let init = if *layer == "urls" { URLS_INIT } else { "" };
        template = template.with_file(format!("{layer}/__init__.py"), text(init));
    }
    template
}

impl TemplateStore for BuiltinTemplateStore {
    fn load(&self, name: &str) -> StrataResult<AppTemplate> {
        self.templates
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| {
                ApplicationError::TemplateNotFound {
                    name: name.to_string(),
                    available: self.templates.iter().map(|t| t.name().to_string()).collect(),
                }
                .into()
            })
    }

    fn list(&self) -> StrataResult<Vec<TemplateSummary>> {
        Ok(self.templates.iter().map(AppTemplate::summary).collect())
    }
}
