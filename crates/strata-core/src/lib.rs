//! Strata Core - Hexagonal Architecture Implementation
//!
//! Domain and application layers for the `strata` scaffolding tool: settings
//! list editing, `__init__.py` import management, layer file scaffolding and
//! app templates.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (Settings, Import, Scaffold, AppTpl)   │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │  (Filesystem, TemplateStore, Renderer)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      strata-adapters (Infrastructure)   │
//! └─────────────────────────────────────────┘
//!
//! Domain layer (pure text grammars) is used by every layer above.
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_core::prelude::*;
//!
//! # fn run(fs: Arc<dyn Filesystem>) -> StrataResult<()> {
//! let service = ScaffoldService::new(fs, LayerCatalog::default(), ".");
//! let plan = service.create_file(CreateFileRequest {
//!     app: "shop".into(),
//!     layer: "controllers".into(),
//!     suffix: "review".into(),
//!     scope: Some("reviews".into()),
//!     ..Default::default()
//! })?;
//! println!("created {}", plan.path.display());
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        AppTemplateService, CleanupRequest, CreateFileRequest, FileChange, ImportService,
        PycacheService, ScaffoldService, SettingsService, StartAppRequest, TemplateService,
        ToggleRequest,
        ports::{DirEntry, Filesystem, TemplateRenderer, TemplateStore},
    };
    pub use crate::domain::{
        AppName, AppTemplate, EditOutcome, ImportLine, LayerCatalog, ProjectStructure,
        RenderContext, ScopePath, SettingsCategory, SettingsOp, TemplateSummary,
    };
    pub use crate::error::{StrataError, StrataResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
