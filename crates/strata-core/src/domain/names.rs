//! Validated names used across the scaffolding commands.
//!
//! Every name that ends up in a path or an import statement must be a Python
//! identifier, so the checks live here once instead of at each call-site.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::DomainError;

fn check_identifier(kind: &'static str, value: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidName {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("name cannot be empty"));
    };
    if !(first == '_' || first.is_alphabetic()) {
        return Err(invalid("must start with a letter or underscore"));
    }
    if !chars.all(|c| c == '_' || c.is_alphanumeric()) {
        return Err(invalid("only letters, digits and underscores are allowed"));
    }
    if value.starts_with("__") {
        return Err(invalid("dunder names are reserved"));
    }
    Ok(())
}

/// Convert `blog_post` into `BlogPost`.
pub fn pascal_case(value: &str) -> String {
    value
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

macro_rules! identifier_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                check_identifier($kind, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// PascalCase form, used for class names in boilerplate.
            pub fn pascal(&self) -> String {
                pascal_case(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

identifier_name!(
    /// Name of a Django app (a top-level package in the project root).
    AppName,
    "app name"
);

identifier_name!(
    /// File identifier inside a layer, e.g. `create` or `review`.
    Suffix,
    "suffix"
);

/// Nested scope below a layer directory, e.g. `user/profile`.
///
/// The empty scope is the layer root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(into = "String")]
pub struct ScopePath(Vec<String>);

impl ScopePath {
    /// The layer root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse `a/b/c`; surrounding and doubled slashes are rejected.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.is_empty() {
            return Ok(Self::root());
        }
        let mut parts = Vec::new();
        for part in value.split('/') {
            check_identifier("scope", part).map_err(|_| DomainError::InvalidName {
                kind: "scope path",
                value: value.to_string(),
                reason: format!("segment '{part}' is not a valid identifier"),
            })?;
            parts.push(part.to_string());
        }
        Ok(Self(parts))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut parts = self.0.clone();
        parts.push(segment.into());
        Self(parts)
    }

    /// Every prefix from the root down to `self`, root first.
    pub fn ancestry(&self) -> Vec<Self> {
        (0..=self.0.len())
            .map(|n| Self(self.0[..n].to_vec()))
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Directory of this scope below `layer_dir`.
    pub fn resolve(&self, layer_dir: &Path) -> PathBuf {
        self.0.iter().fold(layer_dir.to_path_buf(), |p, s| p.join(s))
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<layer root>")
        } else {
            f.write_str(&self.0.join("/"))
        }
    }
}

impl From<ScopePath> for String {
    fn from(scope: ScopePath) -> Self {
        scope.0.join("/")
    }
}
