//! Application services - orchestrate use cases.
//!
//! Each service owns its ports and a project root; paths in requests and
//! reports are relative to that root.

pub mod app_template_service;
pub mod import_service;
pub mod pycache_service;
pub mod scaffold_service;
pub mod settings_service;
pub mod template_service;

pub use app_template_service::{AppTemplateService, StartAppReport, StartAppRequest};
pub use import_service::{ImportReport, ImportService};
pub use pycache_service::{PycacheDir, PycacheReport, PycacheService};
pub use scaffold_service::{
    CleanupReport, CleanupRequest, CreateFileRequest, FilePlan, ScaffoldService, ToggleReport,
    ToggleRequest,
};
pub use settings_service::{PlannedSettingsEdit, SettingsEdit, SettingsService};
pub use template_service::TemplateService;

#[cfg(test)]
mod tests;
