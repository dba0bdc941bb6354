//! Application layer for Strata.
//!
//! - **Services**: use case orchestration (settings edits, imports, layer
//!   files, app templates, cache cleanup)
//! - **Ports**: traits for the filesystem and template sources
//! - **Errors**: application-specific error types
//!
//! Services load state through ports, let the domain compute the change in
//! memory, and only then write.

pub mod error;
pub mod ports;
pub mod report;
pub mod services;

pub use services::{
    AppTemplateService, CleanupReport, CleanupRequest, CreateFileRequest, FilePlan,
    ImportReport, ImportService, PycacheReport, PycacheService, ScaffoldService, SettingsEdit,
    SettingsService, StartAppReport, StartAppRequest, TemplateService, ToggleReport,
    ToggleRequest,
};

pub use ports::{DirEntry, Filesystem, TemplateRenderer, TemplateStore};

pub use error::ApplicationError;
pub use report::FileChange;
