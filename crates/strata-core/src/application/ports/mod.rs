//! Application ports (traits) for external dependencies.
//!
//! Driven ports are called by the services and implemented in
//! `strata-adapters`:
//!
//! - `Filesystem`: file and directory operations
//! - `TemplateStore`: app template lookup
//! - `TemplateRenderer`: placeholder substitution

pub mod output;

pub use output::{DirEntry, Filesystem, TemplateRenderer, TemplateStore};
