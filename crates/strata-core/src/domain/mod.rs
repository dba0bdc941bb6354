//! Core domain layer for Strata.
//!
//! Pure text grammars and value objects: no filesystem access happens here.
//! Every mutation is computed in memory; the application layer decides when
//! and how results reach the disk.
//!
//! - `settings_list`: named list literals in a Python settings file
//! - `import_block` / `aggregator_tree`: `__init__.py` import management
//! - `layer`: layer catalog and file boilerplate
//! - `entities`: app templates and rendered structures
pub mod aggregator_tree;
pub mod entities;
pub mod error;
pub mod import_block;
pub mod layer;
pub mod names;
pub mod settings_list;

mod validation;

pub use aggregator_tree::{AGGREGATOR_FILE, AggregatorTree, AggregatorWrite, TreeChanges};
pub use entities::{
    common::RelativePath,
    project_structure::{DirectoryToCreate, FileToWrite, FsEntry, ProjectStructure},
    template::{
        AppTemplate, RenderContext, TemplateContent, TemplateEntry, TemplateSource,
        TemplateSummary,
    },
};
pub use error::{DomainError, ErrorCategory};
pub use import_block::{ImportBlock, ImportLine, ImportOutcome};
pub use layer::{LayerCatalog, LayerFile};
pub use names::{AppName, ScopePath, Suffix, pascal_case};
pub use settings_list::{
    EditOutcome, EntryState, ProjectAppRegistry, SettingsCategory, SettingsDocument,
    SettingsList, SettingsOp,
};
pub use validation::DomainValidator;
