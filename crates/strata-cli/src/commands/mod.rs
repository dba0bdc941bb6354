//! Command handlers.
//!
//! Each handler translates its arguments into a core request, calls one
//! service and renders the report. No business logic lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_adapters::{
    BuiltinTemplateStore, ChainedTemplateStore, DirectoryTemplateStore, LocalFilesystem,
};
use strata_core::application::{Filesystem, SettingsService, TemplateStore};

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod clean_pycache;
pub mod completions;
pub mod config;
pub mod list_templates;
pub mod manage_file;
pub mod manage_project_app;
pub mod start_app;

/// The project a command operates on: its root and the filesystem port.
pub struct Project {
    root: PathBuf,
    filesystem: Arc<dyn Filesystem>,
}

impl Project {
    /// Open the project root selected by `-C` (or the current directory).
    pub fn open(global: &GlobalArgs) -> CliResult<Self> {
        let root = global.root();
        if !root.is_dir() {
            return Err(CliError::InvalidInput {
                message: format!("project root '{}' is not a directory", root.display()),
                source: None,
            });
        }
        Ok(Self {
            root,
            filesystem: Arc::new(LocalFilesystem::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filesystem(&self) -> Arc<dyn Filesystem> {
        Arc::clone(&self.filesystem)
    }

    pub fn settings(&self, config: &AppConfig) -> SettingsService {
        SettingsService::new(
            self.filesystem(),
            self.root.clone(),
            config.project.settings_file.clone(),
        )
    }

    /// An explicit template directory, or the project's template directory
    /// in front of the built-in templates.
    pub fn template_store(
        &self,
        config: &AppConfig,
        template_path: Option<&Path>,
    ) -> Box<dyn TemplateStore> {
        match template_path {
            Some(path) => Box::new(DirectoryTemplateStore::single(path)),
            None => Box::new(ChainedTemplateStore::new(vec![
                Box::new(DirectoryTemplateStore::new(self.root.join(&config.templates.dir))),
                Box::new(BuiltinTemplateStore::new()),
            ])),
        }
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
