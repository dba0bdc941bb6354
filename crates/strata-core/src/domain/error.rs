// ============================================================================
// domain/error.rs - TEXT GRAMMAR AND NAMING ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports carry them across layers)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("'{value}' is not a valid {kind}: {reason}")]
    InvalidName {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown layer '{layer}'")]
    UnknownLayer { layer: String, valid: Vec<String> },

    #[error("conflicting flags: {}", flags.join(", "))]
    ConflictingFlags { flags: Vec<&'static str> },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Duplicate path in template: {path}")]
    DuplicatePath { path: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    // ========================================================================
    // Settings list grammar
    // ========================================================================
    #[error("list '{list}' not found in settings file")]
    ListNotFound { list: String },

    #[error("list '{list}' has no closing bracket")]
    UnterminatedList { list: String },

    #[error("'{key}' not found in {list}")]
    EntryNotFound { list: String, key: String },

    #[error("'{key}' matches {count} entries in {list}")]
    AmbiguousEntry {
        list: String,
        key: String,
        count: usize,
    },

    #[error("'{key}' is already registered in {list}, refusing to add it to {requested}")]
    AlreadyRegistered {
        key: String,
        list: String,
        requested: String,
    },

    // ========================================================================
    // Import block grammar
    // ========================================================================
    #[error("'{name}' is already imported from '{existing}', refusing to rebind it to '{requested}'")]
    ImportConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("import '{statement}' not found in {aggregator}")]
    ImportNotFound {
        statement: String,
        aggregator: String,
    },

    #[error("scope '{scope}' does not exist")]
    ScopeNotFound { scope: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidName { kind, .. } => vec![
                format!("A {kind} must be a valid Python identifier"),
                "Use lowercase letters, digits and underscores; do not start with '__'".into(),
            ],
            Self::UnknownLayer { valid, .. } => vec![
                format!("Valid layers: {}", valid.join(", ")),
                "Add custom layers under [layers] valid = [...] in strata.toml".into(),
            ],
            Self::ConflictingFlags { flags } => vec![
                format!("Pass only one of: {}", flags.join(", ")),
            ],
            Self::ListNotFound { list } => vec![
                format!("Declare `{list} = [` in the settings file"),
                "Or point [project] settings_file at the right file".into(),
            ],
            Self::UnterminatedList { list } => vec![
                format!("Close the `{list}` list literal with ']'"),
            ],
            Self::EntryNotFound { list, .. } => vec![
                format!("Check the spelling against the entries of {list}"),
            ],
            Self::AmbiguousEntry { list, key, .. } => vec![
                format!("'{key}' appears more than once in {list}"),
                "Remove the duplicate lines by hand, then retry".into(),
            ],
            Self::AlreadyRegistered { key, list, .. } => vec![
                format!("An app label may only be registered once; '{key}' is active in {list}"),
                format!("Remove or soft-remove it from {list} first"),
            ],
            Self::ImportConflict { name, existing, .. } => vec![
                format!("'{name}' is already bound by `from {existing} import ...`"),
                "Rename the symbol or remove the existing import first".into(),
            ],
            Self::ImportNotFound { .. } => vec![
                "Create the file first with `strata manage-file`".into(),
                "Check --scope matches the directory the file lives in".into(),
            ],
            Self::ScopeNotFound { scope } => vec![
                format!("No directory for scope '{scope}' inside the layer"),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ListNotFound { .. }
            | Self::EntryNotFound { .. }
            | Self::ImportNotFound { .. }
            | Self::ScopeNotFound { .. } => ErrorCategory::NotFound,
            Self::AmbiguousEntry { .. }
            | Self::AlreadyRegistered { .. }
            | Self::ImportConflict { .. } => ErrorCategory::Conflict,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}
