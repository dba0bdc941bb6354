//! Infrastructure adapters for Strata.
//!
//! This crate implements the ports defined in `strata_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod renderer;
pub mod template_store;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use renderer::PlaceholderRenderer;
pub use template_store::{BuiltinTemplateStore, ChainedTemplateStore, DirectoryTemplateStore};
