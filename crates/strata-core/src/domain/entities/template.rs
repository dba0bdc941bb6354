//! App templates and placeholder substitution.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  AppTemplate                                                │
//! │  ├── name, description, source (built-in | directory)       │
//! │  └── entries: [TemplateEntry]                               │
//! │      ├── Directory("{{app_name}}/migrations")               │
//! │      └── File("{{app_name}}_views.py", Text | Binary)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RenderContext                                              │
//! │  └── {{APP_NAME}} -> "blog", {{APP_CLASS_NAME}} -> "Blog"   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Placeholders are replaced in directory names, file names and text file
//! content. Binary files are copied verbatim.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use chrono::Datelike;
use serde::Serialize;

use super::common::RelativePath;
use super::project_structure::ProjectStructure;
use crate::domain::{AppName, DomainError};

/// Where a template was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum TemplateSource {
    Builtin,
    Directory(PathBuf),
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in"),
            Self::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateContent {
    Text(String),
    Binary(Vec<u8>),
}

impl TemplateContent {
    /// Text when the bytes are UTF-8 without NUL bytes, binary otherwise.
    pub fn detect(bytes: Vec<u8>) -> Self {
        if bytes.contains(&0) {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEntry {
    Directory(String),
    File { path: String, content: TemplateContent },
}

impl TemplateEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::Directory(path) | Self::File { path, .. } => path,
        }
    }
}

/// Short description used by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub description: Option<String>,
    pub source: TemplateSource,
}

/// A read-only tree of directories and files with `{{TOKEN}}` placeholders.
///
/// Paths are relative to the new app directory and use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTemplate {
    name: String,
    description: Option<String>,
    source: TemplateSource,
    entries: Vec<TemplateEntry>,
}

impl AppTemplate {
    pub fn new(name: impl Into<String>, source: TemplateSource) -> Self {
        Self {
            name: name.into(),
            description: None,
            source,
            entries: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_directory(mut self, path: impl Into<String>) -> Self {
        self.entries.push(TemplateEntry::Directory(path.into()));
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: TemplateContent) -> Self {
        self.entries.push(TemplateEntry::File {
            path: path.into(),
            content,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            source: self.source.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.entries.is_empty() {
            return Err(DomainError::InvalidTemplate(format!(
                "template '{}' has no files",
                self.name
            )));
        }
        Ok(())
    }

    /// Substitute placeholders everywhere and check the resulting paths.
    pub fn render(&self, ctx: &RenderContext) -> Result<ProjectStructure, DomainError> {
        self.validate()?;
        let mut structure = ProjectStructure::new();
        for entry in &self.entries {
            let path = RelativePath::try_new(ctx.render(entry.path()))?;
            match entry {
                TemplateEntry::Directory(_) => structure.add_directory(path),
                TemplateEntry::File { content, .. } => {
                    let bytes = match content {
                        TemplateContent::Text(text) => ctx.render(text).into_bytes(),
                        TemplateContent::Binary(bytes) => bytes.clone(),
                    };
                    structure.add_file(path, bytes);
                }
            }
        }
        structure.validate()?;
        Ok(structure)
    }
}

/// Token values for one rendering.
///
/// | Token | `blog_post` |
/// |-------|-------------|
/// | `APP_NAME`, `app_name` | `blog_post` |
/// | `APP_CLASS_NAME` | `BlogPost` |
/// | `APP_NAME_KEBAB` | `blog-post` |
/// | `YEAR` | current year |
#[derive(Debug, Clone)]
pub struct RenderContext {
    variables: HashMap<String, String>,
}

impl RenderContext {
    pub fn for_app(name: &AppName) -> Self {
        let mut vars = HashMap::new();
        vars.insert("APP_NAME".to_string(), name.to_string());
        vars.insert("app_name".to_string(), name.to_string());
        vars.insert("APP_CLASS_NAME".to_string(), name.pascal());
        vars.insert("APP_NAME_KEBAB".to_string(), name.as_str().replace('_', "-"));
        vars.insert("YEAR".to_string(), chrono::Local::now().year().to_string());
        Self { variables: vars }
    }

    /// Add or override a variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Replace every known `{{TOKEN}}` in one left-to-right pass.
    ///
    /// Unknown tokens stay as written, and substituted values are never
    /// scanned again. Matching is case-sensitive.
    pub fn render(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => match self.variables.get(&after[..end]) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after[end + 2..];
                    }
                    None => {
                        out.push('{');
                        rest = &rest[start + 1..];
                    }
                },
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
