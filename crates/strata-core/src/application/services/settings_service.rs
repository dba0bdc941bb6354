//! Settings Service - edits the app category lists of the settings file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{
        AppName, DomainError, EditOutcome, ProjectAppRegistry, SettingsCategory, SettingsDocument, SettingsOp,
    },
    error::StrataResult,
};

/// Outcome of one settings edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsEdit {
    pub path: PathBuf,
    pub list: &'static str,
    pub key: String,
    pub outcome: EditOutcome,
    pub written: bool,
    pub dry_run: bool,
}

/// An edit computed against the current file but not yet written.
#[derive(Debug, Clone)]
pub struct PlannedSettingsEdit {
    pub edit: SettingsEdit,
    document: SettingsDocument,
}

pub struct SettingsService {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
    settings_file: PathBuf,
}

impl SettingsService {
    /// `settings_file` is relative to the project `root`.
    pub fn new(
        filesystem: Arc<dyn Filesystem>,
        root: impl Into<PathBuf>,
        settings_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            filesystem,
            root: root.into(),
            settings_file: settings_file.into(),
        }
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    fn load(&self) -> StrataResult<SettingsDocument> {
        let path = self.root.join(&self.settings_file);
        if !self.filesystem.exists(&path) {
            return Err(ApplicationError::NotFound {
                what: "settings file",
                path: self.settings_file.clone(),
            }
            .into());
        }
        Ok(SettingsDocument::new(self.filesystem.read_to_string(&path)?))
    }

    /// Parse the project app registry from the settings file.
    pub fn registry(&self) -> StrataResult<ProjectAppRegistry> {
        Ok(ProjectAppRegistry::from_document(&self.load()?)?)
    }

    /// Compute an edit without writing. Grammar errors surface here, and so
    /// does an add of a key that is already active in another category.
    #[instrument(skip_all, fields(list = category.list_name(), %key))]
    pub fn plan(
        &self,
        category: SettingsCategory,
        key: &str,
        op: &SettingsOp,
    ) -> StrataResult<PlannedSettingsEdit> {
        let current = self.load()?;
        if matches!(op, SettingsOp::Add { .. })
            && let Some(holder) = ProjectAppRegistry::from_document(&current)?.category_of(key)
            && holder != category
        {
            return Err(DomainError::AlreadyRegistered {
                key: key.to_string(),
                list: holder.list_name().to_string(),
                requested: category.list_name().to_string(),
            }
            .into());
        }
        let (outcome, document) = current.edit(category.list_name(), key, op)?;
        Ok(PlannedSettingsEdit {
            edit: SettingsEdit {
                path: self.settings_file.clone(),
                list: category.list_name(),
                key: key.to_string(),
                outcome,
                written: false,
                dry_run: false,
            },
            document,
        })
    }

    /// Write a planned edit with write-temp-then-rename.
    pub fn commit(&self, planned: PlannedSettingsEdit) -> StrataResult<SettingsEdit> {
        let mut edit = planned.edit;
        if edit.outcome.is_change() {
            let path = self.root.join(&self.settings_file);
            self.filesystem
                .write_atomic(&path, planned.document.text().as_bytes())?;
            edit.written = true;
            info!(list = edit.list, key = %edit.key, outcome = %edit.outcome, "Settings updated");
        } else {
            info!(list = edit.list, key = %edit.key, outcome = %edit.outcome, "Settings unchanged");
        }
        Ok(edit)
    }

    /// Apply `op` for `key` in the list for `category`.
    ///
    /// Adding a project app whose package directory is missing is refused
    /// unless `force` is set.
    #[instrument(skip_all, fields(list = category.list_name(), %key, dry_run = dry_run))]
    pub fn edit(
        &self,
        category: SettingsCategory,
        key: &str,
        op: &SettingsOp,
        force: bool,
        dry_run: bool,
    ) -> StrataResult<SettingsEdit> {
        if category == SettingsCategory::Project {
            AppName::parse(key)?;
            if matches!(op, SettingsOp::Add { .. }) {
                let app_dir = self.root.join(key);
                if !self.filesystem.is_dir(&app_dir) {
                    if !force {
                        return Err(ApplicationError::AppFolderMissing {
                            app: key.to_string(),
                            path: PathBuf::from(key),
                        }
                        .into());
                    }
                    warn!(app = key, "Registering app without a package directory");
                }
            }
        }

        let planned = self.plan(category, key, op)?;
        if dry_run {
            let mut edit = planned.edit;
            edit.dry_run = true;
            return Ok(edit);
        }
        self.commit(planned)
    }
}
