//! Driven (output) ports - implemented by infrastructure.

use std::path::{Path, PathBuf};

use crate::domain::{AppTemplate, ProjectStructure, RenderContext, TemplateSummary};
use crate::error::StrataResult;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `strata_adapters::LocalFilesystem` (production)
/// - `strata_adapters::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StrataResult<()>;

    fn read_to_string(&self, path: &Path) -> StrataResult<String>;

    /// Plain write, used for brand new files.
    fn write_file(&self, path: &Path, content: &[u8]) -> StrataResult<()>;

    /// Write to a temporary sibling, then rename over `path`.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> StrataResult<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> StrataResult<Vec<DirEntry>>;

    fn file_size(&self, path: &Path) -> StrataResult<u64>;

    fn remove_file(&self, path: &Path) -> StrataResult<()>;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> StrataResult<()>;

    fn rename(&self, from: &Path, to: &Path) -> StrataResult<()>;
}

/// Port for app template lookup.
///
/// Implemented by:
/// - `strata_adapters::BuiltinTemplateStore` (the embedded `default` template)
/// - `strata_adapters::DirectoryTemplateStore` (templates on disk)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateStore: Send + Sync {
    /// Load a template by name; `TemplateNotFound` if absent.
    fn load(&self, name: &str) -> StrataResult<AppTemplate>;

    /// All templates this store can load, sorted by name.
    fn list(&self) -> StrataResult<Vec<TemplateSummary>>;
}

/// Port for template rendering.
///
/// Implemented by `strata_adapters::PlaceholderRenderer`.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &AppTemplate, context: &RenderContext) -> StrataResult<ProjectStructure>;
}
