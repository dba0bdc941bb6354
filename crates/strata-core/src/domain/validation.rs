use crate::domain::{
    AppName, DomainError, LayerCatalog,
    entities::{AppTemplate, ProjectStructure},
};

/// Centralized domain validation.
///
/// Services call these before touching the filesystem, so a failed check
/// never leaves a partial write behind.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_app_name(name: &str) -> Result<AppName, DomainError> {
        AppName::parse(name)
    }

    pub fn validate_layer(catalog: &LayerCatalog, layer: &str) -> Result<(), DomainError> {
        catalog.check(layer)
    }

    pub fn validate_template(template: &AppTemplate) -> Result<(), DomainError> {
        template.validate()
    }

    pub fn validate_structure(structure: &ProjectStructure) -> Result<(), DomainError> {
        structure.validate()
    }

    /// At most one of the named action flags may be set.
    pub fn exclusive_flags(flags: &[(&'static str, bool)]) -> Result<(), DomainError> {
        let set: Vec<&'static str> = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();
        if set.len() > 1 {
            return Err(DomainError::ConflictingFlags { flags: set });
        }
        Ok(())
    }
}
