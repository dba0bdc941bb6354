//! Import Service - aggregator maintenance for one layer directory.
//!
//! Loads a layer's `__init__.py` files into an [`AggregatorTree`], applies one
//! mutation in memory, and flushes only the aggregators that changed.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    application::{ApplicationError, FileChange, ports::Filesystem},
    domain::{AGGREGATOR_FILE, AggregatorTree, ImportLine, ImportOutcome, ScopePath, TreeChanges},
    error::StrataResult,
};

/// Result of one import mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub aggregator: PathBuf,
    pub statement: String,
    pub outcome: ImportOutcome,
    pub changes: Vec<FileChange>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Enable,
    Disable,
}

const PYCACHE_DIR: &str = "__pycache__";

pub struct ImportService {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
}

impl ImportService {
    /// `root` is the project root; layer directories are given relative to it.
    pub fn new(filesystem: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            root: root.into(),
        }
    }

    fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Read every scope below `layer_dir` into a tree.
    ///
    /// A subdirectory is a scope when its name is an identifier and it holds
    /// at least one module. A scope that also contains anything else (data
    /// files, non-scope folders other than `__pycache__`) is retained, so
    /// cleanup never deletes it.
    #[instrument(skip_all, fields(layer_dir = %layer_dir.display()))]
    pub fn load_tree(&self, layer_dir: &Path) -> StrataResult<AggregatorTree> {
        let abs_layer = self.abs(layer_dir);
        if !self.filesystem.is_dir(&abs_layer) {
            return Err(ApplicationError::NotFound {
                what: "layer directory",
                path: layer_dir.to_path_buf(),
            }
            .into());
        }

        let mut tree = AggregatorTree::new(layer_dir);
        let mut queue = VecDeque::from([ScopePath::root()]);

        while let Some(scope) = queue.pop_front() {
            let dir = scope.resolve(&abs_layer);
            let mut aggregator = None;
            let mut sources = Vec::new();
            let mut children = Vec::new();
            let mut foreign = false;

            for entry in self.filesystem.list_dir(&dir)? {
                if entry.is_dir {
                    if entry.name == PYCACHE_DIR {
                        continue;
                    }
                    if ScopePath::parse(&entry.name).is_ok() && self.is_package(&entry.path)? {
                        children.push(scope.child(&entry.name));
                    } else {
                        foreign = true;
                    }
                } else if entry.name == AGGREGATOR_FILE {
                    aggregator = Some(self.filesystem.read_to_string(&entry.path)?);
                } else if let Some(stem) = entry.name.strip_suffix(".py") {
                    sources.push(stem.to_string());
                } else {
                    foreign = true;
                }
            }

            tree.load_scope(scope.clone(), aggregator.as_deref(), sources)?;
            if foreign {
                debug!(%scope, "Scope holds foreign content");
                tree.retain_dir(&scope)?;
            }
            queue.extend(children);
        }

        debug!(scopes = tree.scopes().len(), "Aggregator tree loaded");
        Ok(tree)
    }

    fn is_package(&self, dir: &Path) -> StrataResult<bool> {
        Ok(self
            .filesystem
            .list_dir(dir)?
            .iter()
            .any(|e| !e.is_dir && e.name.ends_with(".py")))
    }

    /// Describe what flushing `tree` would do.
    pub fn plan(&self, changes: &TreeChanges) -> Vec<FileChange> {
        let mut out = Vec::new();
        for write in &changes.writes {
            if write.create_dir {
                out.push(FileChange::CreateDir(write.dir.clone()));
            }
            if write.create_file {
                out.push(FileChange::CreateFile(write.path.clone()));
            } else {
                out.push(FileChange::UpdateFile(write.path.clone()));
            }
        }
        for (_, dir) in &changes.removed_dirs {
            out.push(FileChange::RemoveDir(dir.clone()));
        }
        out
    }

    /// Create missing scope directories and rewrite changed aggregators.
    pub fn flush_writes(&self, changes: &TreeChanges) -> StrataResult<()> {
        for write in &changes.writes {
            if write.create_dir {
                self.filesystem.create_dir_all(&self.abs(&write.dir))?;
            }
            self.filesystem
                .write_atomic(&self.abs(&write.path), write.content.as_bytes())?;
            debug!(path = %write.path.display(), "Aggregator written");
        }
        Ok(())
    }

    /// Delete scope directories removed by cleanup.
    pub fn flush_removals(&self, changes: &TreeChanges) -> StrataResult<()> {
        for (scope, dir) in &changes.removed_dirs {
            self.filesystem.remove_dir_all(&self.abs(dir))?;
            info!(%scope, "Removed empty scope");
        }
        Ok(())
    }

    fn finish(
        &self,
        tree: &AggregatorTree,
        scope: &ScopePath,
        line: &ImportLine,
        outcome: ImportOutcome,
        dry_run: bool,
    ) -> StrataResult<ImportReport> {
        let changes = tree.changes();
        let planned = self.plan(&changes);
        if !dry_run {
            self.flush_writes(&changes)?;
            self.flush_removals(&changes)?;
        }
        Ok(ImportReport {
            aggregator: tree.aggregator_path(scope),
            statement: line.to_string(),
            outcome,
            changes: planned,
            dry_run,
        })
    }

    /// Add `line` to the aggregator of `scope`, creating the scope chain.
    #[instrument(skip_all, fields(layer_dir = %layer_dir.display(), %scope, %line))]
    pub fn add_import(
        &self,
        layer_dir: &Path,
        scope: &ScopePath,
        line: ImportLine,
        dry_run: bool,
    ) -> StrataResult<ImportReport> {
        let mut tree = self.load_tree(layer_dir)?;
        tree.ensure_scope(scope)?;
        let outcome = tree.add_import(scope, line.clone(), None)?;
        info!(?outcome, "Import added");
        self.finish(&tree, scope, &line, outcome, dry_run)
    }

    /// Remove `line` from the aggregator of `scope`; absent lines are a no-op.
    #[instrument(skip_all, fields(layer_dir = %layer_dir.display(), %scope, %line))]
    pub fn remove_import(
        &self,
        layer_dir: &Path,
        scope: &ScopePath,
        line: ImportLine,
        dry_run: bool,
    ) -> StrataResult<bool> {
        let mut tree = self.load_tree(layer_dir)?;
        let removed = tree.remove_import(scope, &line)?;
        let changes = tree.changes();
        if removed && !dry_run {
            self.flush_writes(&changes)?;
        }
        Ok(removed)
    }

    pub fn disable_import(
        &self,
        layer_dir: &Path,
        scope: &ScopePath,
        line: ImportLine,
        dry_run: bool,
    ) -> StrataResult<ImportReport> {
        self.toggle(layer_dir, scope, line, Toggle::Disable, dry_run)
    }

    pub fn enable_import(
        &self,
        layer_dir: &Path,
        scope: &ScopePath,
        line: ImportLine,
        dry_run: bool,
    ) -> StrataResult<ImportReport> {
        self.toggle(layer_dir, scope, line, Toggle::Enable, dry_run)
    }

    #[instrument(skip_all, fields(layer_dir = %layer_dir.display(), %scope, %line))]
    fn toggle(
        &self,
        layer_dir: &Path,
        scope: &ScopePath,
        line: ImportLine,
        toggle: Toggle,
        dry_run: bool,
    ) -> StrataResult<ImportReport> {
        let mut tree = self.load_tree(layer_dir)?;
        let outcome = match toggle {
            Toggle::Enable => tree.enable_import(scope, &line)?,
            Toggle::Disable => tree.disable_import(scope, &line)?,
        };
        info!(?outcome, "Import toggled");
        self.finish(&tree, scope, &line, outcome, dry_run)
    }

    /// Remove scopes without modules or child scopes, bottom-up.
    #[instrument(skip_all, fields(layer_dir = %layer_dir.display()))]
    pub fn cleanup_empty_scopes(&self, layer_dir: &Path, dry_run: bool) -> StrataResult<Vec<FileChange>> {
        let mut tree = self.load_tree(layer_dir)?;
        let removed = tree.cleanup_empty_scopes();
        info!(removed = removed.len(), "Empty scope cleanup");
        let changes = tree.changes();
        let planned = self.plan(&changes);
        if !dry_run {
            self.flush_writes(&changes)?;
            self.flush_removals(&changes)?;
        }
        Ok(planned)
    }
}
