//! Scaffold Service - layer file lifecycle.
//!
//! 1. Validate names, layer and paths (nothing is written before this passes)
//! 2. Load the layer's aggregator tree
//! 3. Apply the change in memory and collect the plan
//! 4. Unless dry-run: write the source file, then the aggregators

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    application::{ApplicationError, FileChange, ImportService, ports::Filesystem},
    domain::{
        AggregatorTree, AppName, DomainValidator as validator, ImportLine, ImportOutcome,
        LayerCatalog, LayerFile, ScopePath, Suffix,
    },
    error::StrataResult,
};

#[derive(Debug, Clone, Default)]
pub struct CreateFileRequest {
    pub app: String,
    pub layer: String,
    pub suffix: String,
    pub scope: Option<String>,
    pub description: Option<String>,
    pub overwrite: bool,
    pub dry_run: bool,
}

/// Everything `create_file` did (or would do).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePlan {
    pub file: LayerFile,
    pub path: PathBuf,
    #[serde(skip)]
    pub content: String,
    pub import: String,
    pub import_outcome: ImportOutcome,
    pub changes: Vec<FileChange>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToggleRequest {
    pub app: String,
    pub layer: String,
    pub suffix: String,
    pub scope: Option<String>,
    pub enable: bool,
    pub disable: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleReport {
    pub aggregator: PathBuf,
    pub import: String,
    pub outcome: ImportOutcome,
    pub changes: Vec<FileChange>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupRequest {
    pub app: String,
    pub layer: String,
    /// `None` removes every unprotected module in the layer (or scope).
    pub suffix: Option<String>,
    pub scope: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupReport {
    pub removed_files: Vec<PathBuf>,
    pub removed_scopes: Vec<String>,
    pub changes: Vec<FileChange>,
    pub dry_run: bool,
}

pub struct ScaffoldService {
    filesystem: Arc<dyn Filesystem>,
    imports: ImportService,
    catalog: LayerCatalog,
    root: PathBuf,
}

impl ScaffoldService {
    pub fn new(filesystem: Arc<dyn Filesystem>, catalog: LayerCatalog, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            imports: ImportService::new(Arc::clone(&filesystem), root.clone()),
            filesystem,
            catalog,
            root,
        }
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Validate the common arguments and check the app and layer directories.
    fn resolve(&self, app: &str, layer: &str, scope: Option<&str>) -> StrataResult<(AppName, ScopePath)> {
        let app = validator::validate_app_name(app)?;
        validator::validate_layer(&self.catalog, layer)?;
        let scope = match scope {
            Some(s) => ScopePath::parse(s)?,
            None => ScopePath::root(),
        };

        let app_dir = PathBuf::from(app.as_str());
        if !self.filesystem.is_dir(&self.abs(&app_dir)) {
            return Err(ApplicationError::NotFound {
                what: "app directory",
                path: app_dir,
            }
            .into());
        }
        let layer_dir = app_dir.join(layer);
        if !self.filesystem.is_dir(&self.abs(&layer_dir)) {
            return Err(ApplicationError::NotFound {
                what: "layer directory",
                path: layer_dir,
            }
            .into());
        }
        Ok((app, scope))
    }

    /// Create a layer file with boilerplate and register it in its aggregator.
    #[instrument(skip_all, fields(app = %req.app, layer = %req.layer, suffix = %req.suffix, dry_run = req.dry_run))]
    pub fn create_file(&self, req: CreateFileRequest) -> StrataResult<FilePlan> {
        let suffix = Suffix::parse(&req.suffix)?;
        let (app, scope) = self.resolve(&req.app, &req.layer, req.scope.as_deref())?;
        let file = LayerFile::new(app, &req.layer, scope.clone(), suffix);
        let path = file.relative_path(&self.catalog);

        let exists = self.filesystem.exists(&self.abs(&path));
        if exists && !req.overwrite {
            return Err(ApplicationError::FileExists { path }.into());
        }

        let module = self.catalog.module_name(&file.suffix);
        let line = ImportLine::forward(&module)?;
        let mut tree = self.imports.load_tree(&file.layer_dir())?;
        tree.ensure_scope(&scope)?;
        let import_outcome = tree.add_import(&scope, line.clone(), None)?;
        tree.add_source(&scope, &module)?;
        if import_outcome == ImportOutcome::PresentDisabled {
            warn!(import = %line, "Import exists but is commented out; leaving it disabled");
        }

        let content = self.catalog.render(&file, req.description.as_deref());
        let tree_changes = tree.changes();

        let mut changes = Vec::new();
        let mut aggregator_changes = self.imports.plan(&tree_changes);
        // scope directories first, then the file, then aggregators
        let dirs: Vec<FileChange> = aggregator_changes
            .iter()
            .filter(|c| matches!(c, FileChange::CreateDir(_)))
            .cloned()
            .collect();
        aggregator_changes.retain(|c| !matches!(c, FileChange::CreateDir(_)));
        changes.extend(dirs);
        changes.push(if exists {
            FileChange::UpdateFile(path.clone())
        } else {
            FileChange::CreateFile(path.clone())
        });
        changes.extend(aggregator_changes);

        if !req.dry_run {
            self.filesystem.create_dir_all(&self.abs(&file.dir()))?;
            if exists {
                self.filesystem.write_atomic(&self.abs(&path), content.as_bytes())?;
            } else {
                self.filesystem.write_file(&self.abs(&path), content.as_bytes())?;
            }
            self.imports.flush_writes(&tree_changes)?;
            info!(path = %path.display(), "Layer file created");
        }

        Ok(FilePlan {
            file,
            path,
            content,
            import: line.to_string(),
            import_outcome,
            changes,
            dry_run: req.dry_run,
        })
    }

    /// Enable or disable a file's import in its aggregator.
    #[instrument(skip_all, fields(app = %req.app, layer = %req.layer, suffix = %req.suffix, enable = req.enable))]
    pub fn toggle(&self, req: ToggleRequest) -> StrataResult<ToggleReport> {
        validator::exclusive_flags(&[("--enable", req.enable), ("--disable", req.disable)])?;
        let suffix = Suffix::parse(&req.suffix)?;
        let (app, scope) = self.resolve(&req.app, &req.layer, req.scope.as_deref())?;
        let layer_dir = PathBuf::from(app.as_str()).join(&req.layer);
        let line = ImportLine::forward(&self.catalog.module_name(&suffix))?;

        let report = if req.disable {
            self.imports
                .disable_import(&layer_dir, &scope, line, req.dry_run)?
        } else {
            self.imports
                .enable_import(&layer_dir, &scope, line, req.dry_run)?
        };

        Ok(ToggleReport {
            aggregator: report.aggregator,
            import: report.statement,
            outcome: report.outcome,
            changes: report.changes,
            dry_run: req.dry_run,
        })
    }

    /// Remove layer files and their imports, then prune empty scopes.
    #[instrument(skip_all, fields(app = %req.app, layer = %req.layer, suffix = ?req.suffix, dry_run = req.dry_run))]
    pub fn cleanup(&self, req: CleanupRequest) -> StrataResult<CleanupReport> {
        let suffix = req.suffix.as_deref().map(Suffix::parse).transpose()?;
        let (app, scope) = self.resolve(&req.app, &req.layer, req.scope.as_deref())?;
        let layer_dir = PathBuf::from(app.as_str()).join(&req.layer);
        let mut tree = self.imports.load_tree(&layer_dir)?;

        let targets: Vec<(ScopePath, String)> = match &suffix {
            Some(suffix) => {
                let file = LayerFile::new(app, &req.layer, scope.clone(), suffix.clone());
                let path = file.relative_path(&self.catalog);
                if !self.filesystem.exists(&self.abs(&path)) {
                    return Err(ApplicationError::NotFound {
                        what: "layer file",
                        path,
                    }
                    .into());
                }
                vec![(scope.clone(), self.catalog.module_name(suffix))]
            }
            None => self.unprotected_modules(&tree, &scope)?,
        };

        let mut removed_files = Vec::new();
        for (module_scope, module) in &targets {
            let line = ImportLine::forward(module)?;
            tree.remove_import(module_scope, &line)?;
            tree.remove_source(module_scope, module)?;
            removed_files.push(module_scope.resolve(&layer_dir).join(format!("{module}.py")));
        }

        let removed_scopes = tree.cleanup_empty_scopes();
        let tree_changes = tree.changes();

        let mut changes = self.imports.plan(&tree_changes);
        let first_removal = changes
            .iter()
            .position(|c| matches!(c, FileChange::RemoveDir(_)))
            .unwrap_or(changes.len());
        for (i, file) in removed_files.iter().enumerate() {
            changes.insert(first_removal + i, FileChange::RemoveFile(file.clone()));
        }

        if !req.dry_run {
            self.imports.flush_writes(&tree_changes)?;
            for file in &removed_files {
                self.filesystem.remove_file(&self.abs(file))?;
            }
            self.imports.flush_removals(&tree_changes)?;
            info!(
                files = removed_files.len(),
                scopes = removed_scopes.len(),
                "Layer cleanup finished"
            );
        }

        Ok(CleanupReport {
            removed_files,
            removed_scopes: removed_scopes.into_iter().map(String::from).collect(),
            changes,
            dry_run: req.dry_run,
        })
    }

    /// Every module at or below `scope` whose file name is not protected.
    fn unprotected_modules(
        &self,
        tree: &AggregatorTree,
        scope: &ScopePath,
    ) -> StrataResult<Vec<(ScopePath, String)>> {
        if !tree.contains(scope) {
            return Err(crate::domain::DomainError::ScopeNotFound {
                scope: scope.to_string(),
            }
            .into());
        }
        let mut out = Vec::new();
        for candidate in tree.scopes() {
            if !candidate.segments().starts_with(scope.segments()) {
                continue;
            }
            for module in tree.sources(&candidate)? {
                if !self.catalog.is_protected(&format!("{module}.py")) {
                    out.push((candidate.clone(), module.to_string()));
                }
            }
        }
        Ok(out)
    }
}
