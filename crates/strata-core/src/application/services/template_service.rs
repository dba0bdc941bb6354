//! Template Service - template queries for listings.

use crate::{
    application::ports::TemplateStore,
    domain::{AppTemplate, TemplateSummary},
    error::StrataResult,
};

/// Service for template lookups.
pub struct TemplateService {
    store: Box<dyn TemplateStore>,
}

impl TemplateService {
    pub fn new(store: Box<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Get a template by name.
    pub fn get(&self, name: &str) -> StrataResult<AppTemplate> {
        self.store.load(name)
    }

    /// List all templates.
    pub fn list(&self) -> StrataResult<Vec<TemplateSummary>> {
        self.store.list()
    }
}
