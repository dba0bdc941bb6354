//! Ordered lookup across several stores.

use std::collections::BTreeSet;

use strata_core::{
    application::{ApplicationError, ports::TemplateStore},
    domain::{AppTemplate, TemplateSummary},
    error::{StrataError, StrataResult},
};

/// Tries each store in order; earlier stores shadow later ones by name.
pub struct ChainedTemplateStore {
    stores: Vec<Box<dyn TemplateStore>>,
}

impl ChainedTemplateStore {
    pub fn new(stores: Vec<Box<dyn TemplateStore>>) -> Self {
        Self { stores }
    }
}

impl TemplateStore for ChainedTemplateStore {
    fn load(&self, name: &str) -> StrataResult<AppTemplate> {
        let mut available = BTreeSet::new();
        for store in &self.stores {
            match store.load(name) {
                Err(StrataError::Application(ApplicationError::TemplateNotFound {
                    available: names,
                    ..
                })) => available.extend(names),
                result => return result,
            }
        }
        Err(ApplicationError::TemplateNotFound {
            name: name.to_string(),
            available: available.into_iter().collect(),
        }
        .into())
    }

    fn list(&self) -> StrataResult<Vec<TemplateSummary>> {
        let mut seen = BTreeSet::new();
        let mut summaries = Vec::new();
        for store in &self.stores {
            for summary in store.list()? {
                if seen.insert(summary.name.clone()) {
                    summaries.push(summary);
                }
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}
