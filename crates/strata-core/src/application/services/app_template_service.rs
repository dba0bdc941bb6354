//! App Template Service - `start-app`.
//!
//! The rendered tree is written into a staging directory next to the
//! destination and renamed into place once complete. A settings edit, when
//! requested, is computed before any write and committed only after the
//! rename succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError, FileChange, SettingsEdit, SettingsService,
        ports::{Filesystem, TemplateRenderer, TemplateStore},
    },
    domain::{
        AppName, DomainValidator as validator, FsEntry, ProjectStructure, RenderContext,
        SettingsCategory, SettingsOp,
    },
    error::StrataResult,
};

#[derive(Debug, Clone)]
pub struct StartAppRequest {
    pub name: String,
    pub template: String,
    /// Parent directory of the new app, relative to the project root.
    pub dest_dir: PathBuf,
    pub force: bool,
    pub add_to_settings: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartAppReport {
    pub app: AppName,
    pub template: String,
    pub destination: PathBuf,
    pub replaced: bool,
    pub files: usize,
    pub directories: usize,
    pub changes: Vec<FileChange>,
    pub settings: Option<SettingsEdit>,
    /// The app is active in one of the registry lists (after this run).
    pub registered: bool,
    pub dry_run: bool,
}

pub struct AppTemplateService {
    store: Box<dyn TemplateStore>,
    renderer: Box<dyn TemplateRenderer>,
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
}

impl AppTemplateService {
    pub fn new(
        store: Box<dyn TemplateStore>,
        renderer: Box<dyn TemplateRenderer>,
        filesystem: Arc<dyn Filesystem>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            renderer,
            filesystem,
            root: root.into(),
        }
    }

    /// Create a new app from a template.
    ///
    /// `settings` is required when `add_to_settings` is set.
    #[instrument(skip_all, fields(app = %req.name, template = %req.template, dry_run = req.dry_run))]
    pub fn start_app(
        &self,
        req: StartAppRequest,
        settings: Option<&SettingsService>,
    ) -> StrataResult<StartAppReport> {
        // 1. Validate
        let app = validator::validate_app_name(&req.name)?;

        // 2. Load template
        let template = self.store.load(&req.template)?;
        validator::validate_template(&template)?;
        info!(template = template.name(), source = %template.source(), "Template loaded");

        // 3. Destination guard
        let destination = req.dest_dir.join(app.as_str());
        let abs_dest = self.root.join(&destination);
        let replaced = self.filesystem.exists(&abs_dest);
        if replaced && !req.force {
            return Err(ApplicationError::DestinationExists { path: destination }.into());
        }

        // 4. Settings edit is computed before anything is written
        let planned_settings = match (req.add_to_settings, settings) {
            (true, Some(settings)) => Some(settings.plan(
                SettingsCategory::Project,
                app.as_str(),
                &SettingsOp::Add { comment: None },
            )?),
            (true, None) => {
                return Err(crate::error::StrataError::Internal {
                    message: "settings service not configured".into(),
                });
            }
            (false, _) => None,
        };
        let registered = planned_settings.is_some()
            || settings.is_some_and(|s| {
                s.registry()
                    .is_ok_and(|registry| registry.is_registered(app.as_str()))
            });

        // 5. Render
        let context = RenderContext::for_app(&app);
        let structure = self.renderer.render(&template, &context)?;
        validator::validate_structure(&structure)?;

        let mut changes = Vec::new();
        if replaced {
            changes.push(FileChange::RemoveDir(destination.clone()));
        }
        changes.push(FileChange::CreateDir(destination.clone()));
        for entry in structure.entries() {
            let path = destination.join(entry.path().as_path());
            changes.push(match entry {
                FsEntry::Directory(_) => FileChange::CreateDir(path),
                FsEntry::File(_) => FileChange::CreateFile(path),
            });
        }
        if let Some(planned) = &planned_settings
            && planned.edit.outcome.is_change()
        {
            changes.push(FileChange::UpdateFile(planned.edit.path.clone()));
        }

        let mut report = StartAppReport {
            app,
            template: template.name().to_string(),
            destination,
            replaced,
            files: structure.files().count(),
            directories: structure.directories().count(),
            changes,
            settings: None,
            registered,
            dry_run: req.dry_run,
        };

        if req.dry_run {
            report.settings = planned_settings.map(|p| {
                let mut edit = p.edit;
                edit.dry_run = true;
                edit
            });
            return Ok(report);
        }

        // 6. Stage and move into place
        self.materialize(&structure, &abs_dest, replaced)?;
        info!(destination = %report.destination.display(), files = report.files, "App created");

        // 7. Register
        if let (Some(planned), Some(settings)) = (planned_settings, settings) {
            report.settings = Some(settings.commit(planned)?);
        }
        Ok(report)
    }

    fn materialize(&self, structure: &ProjectStructure, dest: &Path, replace: bool) -> StrataResult<()> {
        let parent = dest.parent().unwrap_or(&self.root).to_path_buf();
        let token = Uuid::new_v4().simple().to_string();
        let staging = parent.join(format!(".strata-staging-{token}"));

        self.filesystem.create_dir_all(&parent)?;
        if let Err(e) = self.write_all(structure, &staging) {
            warn!("Write failed, removing staging directory");
            self.rollback(&staging);
            return Err(e);
        }

        if replace {
            let backup = parent.join(format!(".strata-replaced-{token}"));
            self.filesystem.rename(dest, &backup)?;
            if let Err(e) = self.filesystem.rename(&staging, dest) {
                warn!("Move into place failed, restoring previous directory");
                self.rollback(&staging);
                self.filesystem.rename(&backup, dest).map_err(|restore| {
                    ApplicationError::RollbackFailed {
                        path: dest.to_path_buf(),
                        reason: restore.to_string(),
                    }
                })?;
                return Err(e);
            }
            self.filesystem.remove_dir_all(&backup)?;
        } else if let Err(e) = self.filesystem.rename(&staging, dest) {
            self.rollback(&staging);
            return Err(e);
        }
        Ok(())
    }

    fn write_all(&self, structure: &ProjectStructure, root: &Path) -> StrataResult<()> {
        self.filesystem.create_dir_all(root)?;
        for entry in structure.entries() {
            let path = root.join(entry.path().as_path());
            match entry {
                FsEntry::Directory(_) => self.filesystem.create_dir_all(&path)?,
                FsEntry::File(file) => {
                    if let Some(parent) = path.parent() {
                        self.filesystem.create_dir_all(parent)?;
                    }
                    self.filesystem.write_file(&path, &file.content)?;
                }
            }
        }
        Ok(())
    }

    /// Best-effort removal of a partial tree.
    fn rollback(&self, dir: &Path) {
        if let Err(e) = self.filesystem.remove_dir_all(dir) {
            warn!(error = %e, path = %dir.display(), "Rollback failed");
        } else {
            info!("Rollback successful");
        }
    }
}
