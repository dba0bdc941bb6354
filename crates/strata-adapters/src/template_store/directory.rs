//! Templates stored as plain directories.
//!
//! # Directory layout expected
//!
//! ```text
//! static/
//! ├── default/
//! │   ├── template.toml              ← optional manifest
//! │   ├── apps.py
//! │   └── {{app_name}}_views.py
//! └── api/
//!     └── ...
//! ```
//!
//! # `template.toml` format
//!
//! ```toml
//! [template]
//! description = "REST app with viewsets"   # optional
//! exclude     = ["*.pyc", "node_modules"]  # optional
//! ```
//!
//! An exclude pattern matches a file or directory name exactly, or by
//! extension when written as `*.ext`. `__pycache__` and `*.pyc` are always
//! skipped.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use strata_core::{
    application::{ApplicationError, ports::TemplateStore},
    domain::{AppTemplate, TemplateContent, TemplateSource, TemplateSummary},
    error::StrataResult,
};

const MANIFEST_FILE: &str = "template.toml";
const ALWAYS_EXCLUDED: &[&str] = &["__pycache__", "*.pyc"];

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    template: ManifestSection,
}

/// `[template]` section.
#[derive(Debug, Default, Deserialize)]
struct ManifestSection {
    description: Option<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Clone)]
enum Layout {
    /// Each subdirectory is a template named after it.
    Collection(PathBuf),
    /// One template directory, loaded whatever name is asked for.
    Single(PathBuf),
}

/// Loads templates from directories on disk.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    layout: Layout,
}

impl DirectoryTemplateStore {
    /// Templates are the subdirectories of `dir`. A missing `dir` is an
    /// empty store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::Collection(dir.into()),
        }
    }

    /// A store serving exactly the template at `path`.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::Single(path.into()),
        }
    }

    fn template_dirs(&self) -> StrataResult<Vec<(String, PathBuf)>> {
        match &self.layout {
            Layout::Single(path) => Ok(vec![(dir_name(path), path.clone())]),
            Layout::Collection(dir) => {
                if !dir.is_dir() {
                    debug!(dir = %dir.display(), "Templates directory not found");
                    return Ok(Vec::new());
                }
                let read_dir = fs::read_dir(dir).map_err(|e| load_error(dir, e))?;
                let mut dirs = Vec::new();
                for entry in read_dir {
                    let entry = entry.map_err(|e| load_error(dir, e))?;
                    let path = entry.path();
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if path.is_dir() && !name.starts_with('.') {
                        dirs.push((name, path));
                    }
                }
                dirs.sort();
                Ok(dirs)
            }
        }
    }

    fn not_found(&self, name: &str) -> StrataResult<AppTemplate> {
        let available = self
            .template_dirs()?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        Err(ApplicationError::TemplateNotFound {
            name: name.to_string(),
            available,
        }
        .into())
    }
}

impl TemplateStore for DirectoryTemplateStore {
    #[instrument(skip(self))]
    fn load(&self, name: &str) -> StrataResult<AppTemplate> {
        let path = match &self.layout {
            Layout::Single(path) => path.clone(),
            Layout::Collection(dir) => dir.join(name),
        };
        if !path.is_dir() {
            return match self.layout {
                Layout::Single(_) => Err(ApplicationError::TemplateLoad {
                    path,
                    reason: "not a directory".into(),
                }
                .into()),
                Layout::Collection(_) => self.not_found(name),
            };
        }
        load_template(&dir_name(&path), &path)
    }

    fn list(&self) -> StrataResult<Vec<TemplateSummary>> {
        let mut summaries = Vec::new();
        for (name, path) in self.template_dirs()? {
            match read_manifest(&path) {
                Ok(manifest) => summaries.push(TemplateSummary {
                    name,
                    description: manifest.template.description,
                    source: TemplateSource::Directory(path),
                }),
                Err(e) => warn!(dir = %path.display(), error = %e, "Skipping template with invalid manifest"),
            }
        }
        Ok(summaries)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn read_manifest(dir: &Path) -> StrataResult<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(Manifest::default());
    }
    let raw = fs::read_to_string(&path).map_err(|e| load_error(&path, e))?;
    Ok(toml::from_str(&raw).map_err(|e| load_error(&path, e))?)
}

fn is_excluded(name: &str, patterns: &[String]) -> bool {
    ALWAYS_EXCLUDED
        .iter()
        .copied()
        .chain(patterns.iter().map(String::as_str))
        .any(|pattern| match pattern.strip_prefix("*.") {
            Some(ext) => name
                .rsplit_once('.')
                .is_some_and(|(_, actual)| actual == ext),
            None => name == pattern,
        })
}

/// Read every file under `dir` into an [`AppTemplate`].
#[instrument(skip_all, fields(dir = %dir.display()))]
fn load_template(name: &str, dir: &Path) -> StrataResult<AppTemplate> {
    let manifest = read_manifest(dir)?;
    let mut template = AppTemplate::new(name, TemplateSource::Directory(dir.to_path_buf()));
    if let Some(description) = manifest.template.description.clone() {
        template = template.with_description(description);
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(&e.file_name().to_string_lossy(), &manifest.template.exclude));

    for entry in walker {
        let entry = entry.map_err(|e| load_error(dir, e))?;
        let rel = entry.path().strip_prefix(dir).map_err(|e| load_error(entry.path(), e))?;
        if entry.depth() == 1 && rel.as_os_str() == MANIFEST_FILE {
            continue;
        }
        let rel = normalize_path(&rel.to_string_lossy());

        if entry.file_type().is_dir() {
            template = template.with_directory(rel);
        } else if entry.file_type().is_file() {
            let bytes = fs::read(entry.path()).map_err(|e| load_error(entry.path(), e))?;
            template = template.with_file(rel, TemplateContent::detect(bytes));
        }
    }

    debug!(entries = template.entries().len(), "Template loaded");
    Ok(template)
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
