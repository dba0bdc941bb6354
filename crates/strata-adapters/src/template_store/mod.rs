//! Template store adapters.
//!
//! Named templates resolve through a [`ChainedTemplateStore`]: project
//! templates on disk first, then the built-in `default` template.

mod builtin;
mod chained;
mod directory;

pub use builtin::BuiltinTemplateStore;
pub use chained::ChainedTemplateStore;
pub use directory::DirectoryTemplateStore;
