//! Application layer errors.
//!
//! These errors describe failures while orchestrating filesystem work.
//! Grammar and naming violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// A required file or directory is missing.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    #[error("template '{name}' not found")]
    TemplateNotFound { name: String, available: Vec<String> },

    /// A template directory or its manifest could not be read.
    #[error("cannot load template from {}: {reason}", path.display())]
    TemplateLoad { path: PathBuf, reason: String },

    /// Registering a project app whose package directory is missing.
    #[error("app folder for '{app}' does not exist at {}", path.display())]
    AppFolderMissing { app: String, path: PathBuf },

    #[error("filesystem error at {}: {reason}", path.display())]
    FilesystemError { path: PathBuf, reason: String },

    /// Best-effort cleanup after a failed write also failed.
    #[error("rollback failed for {}: {reason}", path.display())]
    RollbackFailed { path: PathBuf, reason: String },

    /// Store access failed (lock poisoned).
    #[error("template store error")]
    StoreLockError,
}

impl ApplicationError {
    pub fn filesystem(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::FilesystemError {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { what, path } => vec![
                format!("Expected {what} at {}", path.display()),
                "Run the command from the project root, or pass --project-root".into(),
            ],
            Self::FileExists { .. } => vec![
                "Use --force to overwrite the existing file".into(),
                "Or pick a different --suffix".into(),
            ],
            Self::DestinationExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --force to replace it (destructive)".into(),
                "Choose a different app name or --dir".into(),
            ],
            Self::TemplateNotFound { available, .. } => {
                let mut tips = vec!["Run `strata list-templates` to see available templates".into()];
                if !available.is_empty() {
                    tips.push(format!("Available: {}", available.join(", ")));
                }
                tips.push("Or point --template-path at a template directory".into());
                tips
            }
            Self::TemplateLoad { .. } => vec![
                "Check the template directory is readable".into(),
                "template.toml must contain a [template] table".into(),
            ],
            Self::AppFolderMissing { app, .. } => vec![
                format!("Create the app first: strata start-app {app}"),
                "Or pass --force to register it anyway".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::RollbackFailed { path, .. } => vec![
                format!("Remove {} by hand before retrying", path.display()),
            ],
            Self::StoreLockError => vec!["Try again in a moment".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::FileExists { .. }
            | Self::DestinationExists { .. }
            | Self::AppFolderMissing { .. } => ErrorCategory::Validation,
            Self::TemplateLoad { .. } => ErrorCategory::Configuration,
            Self::FilesystemError { .. } | Self::RollbackFailed { .. } | Self::StoreLockError => {
                ErrorCategory::Internal
            }
        }
    }
}
