//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`LayerCatalog`] and
//! paths derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. Environment variables, `STRATA__SECTION__KEY`
//! 2. The file given with `--config`
//! 3. `strata.toml` in the project root
//! 4. The global file in the platform config directory
//! 5. Built-in defaults (always present)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use strata_core::domain::LayerCatalog;

use crate::cli::global::GlobalArgs;

/// File name of the per-project configuration.
pub const PROJECT_CONFIG_FILE: &str = "strata.toml";

const ENV_PREFIX: &str = "STRATA";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub project: ProjectConfig,
    pub templates: TemplateConfig,
    pub layers: LayerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Settings module holding the app lists, relative to the project root.
    pub settings_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory of named templates, relative to the project root.
    pub dir: PathBuf,
    /// Template used by `start-app` when none is named.
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub valid: Vec<String>,
    pub protected: Vec<String>,
    pub file_prefix: String,
    /// Per-layer replacement of the default imports of a new file.
    pub imports: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from("config/settings/apps_middlewares.py"),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static"),
            default: "default".into(),
        }
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            valid: LayerCatalog::default().valid_layers().to_vec(),
            protected: vec!["__init__.py".into()],
            file_prefix: String::new(),
            imports: BTreeMap::new(),
        }
    }
}

impl LayerConfig {
    /// Build the core catalog from these settings.
    pub fn catalog(&self) -> LayerCatalog {
        self.imports.iter().fold(
            LayerCatalog::default()
                .with_valid_layers(self.valid.iter().cloned())
                .with_protected(self.protected.iter().cloned())
                .with_file_prefix(self.file_prefix.clone()),
            |catalog, (layer, lines)| catalog.with_imports(layer.clone(), lines.iter().cloned()),
        )
    }
}

impl AppConfig {
    /// Load configuration for the project root selected by `args`.
    pub fn load(args: &GlobalArgs) -> anyhow::Result<Self> {
        Self::load_from(&Self::sources(args))
    }

    /// Merge defaults, the given files (missing ones are skipped, later ones
    /// win) and the environment.
    pub fn load_from(files: &[PathBuf]) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to encode default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);
        for file in files {
            builder = builder.add_source(config::File::from(file.as_path()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .context("Failed to read configuration sources")?;
        settings
            .try_deserialize()
            .context("Configuration does not match the expected schema")
    }

    /// Files consulted, lowest priority first.
    pub fn sources(args: &GlobalArgs) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if let Some(global) = Self::global_config_path() {
            files.push(global);
        }
        files.push(Self::project_config_path(&args.root()));
        if let Some(explicit) = &args.config {
            files.push(explicit.clone());
        }
        files
    }

    /// Path to the global configuration file, if the platform has one.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(PROJECT_CONFIG_FILE)
    }
}
