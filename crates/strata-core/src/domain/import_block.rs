//! Import block grammar for `__init__.py` aggregators.
//!
//! Each line is either a recognised single-name import (possibly commented
//! out) or opaque text. Toggling only adds or strips the leading comment
//! marker, so disable followed by enable restores the exact original line.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{DomainError, EntryState};

static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<indent>\s*)(?P<marker>#\s*)?(?P<stmt>from\s+(?P<module>\.*[A-Za-z_][\w.]*|\.+)\s+import\s+(?P<symbol>\*|[A-Za-z_]\w*)(?:\s+as\s+(?P<alias>[A-Za-z_]\w*))?\s*(?P<comment>#.*)?)$",
    )
    .expect("import regex is valid")
});

static SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("symbol regex is valid"));

static MODULE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.*[A-Za-z_][\w]*(\.[A-Za-z_]\w*)*|\.+)$").expect("module regex is valid"));

/// `from <module> import <symbol>[ as <alias>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportLine {
    module: String,
    symbol: String,
    alias: Option<String>,
}

impl ImportLine {
    pub fn new(module: impl Into<String>, symbol: impl Into<String>) -> Result<Self, DomainError> {
        let module = module.into();
        let symbol = symbol.into();
        if !MODULE_PATH.is_match(&module) {
            return Err(DomainError::InvalidName {
                kind: "module path",
                value: module,
                reason: "expected a dotted Python module path".into(),
            });
        }
        if symbol != "*" && !SYMBOL.is_match(&symbol) {
            return Err(DomainError::InvalidName {
                kind: "symbol",
                value: symbol,
                reason: "expected a Python identifier or '*'".into(),
            });
        }
        Ok(Self {
            module,
            symbol,
            alias: None,
        })
    }

    /// Star import `from <module> import *`.
    pub fn glob(module: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(module, "*")
    }

    /// Forwarding import `from .<name> import *` for a sibling module or package.
    pub fn forward(name: &str) -> Result<Self, DomainError> {
        Self::glob(format!(".{name}"))
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_glob(&self) -> bool {
        self.symbol == "*"
    }

    /// Name this import binds in the aggregator namespace; `None` for `*`.
    pub fn bound_name(&self) -> Option<&str> {
        if self.is_glob() {
            None
        } else {
            Some(self.alias.as_deref().unwrap_or(&self.symbol))
        }
    }

    fn same_target(&self, other: &ImportLine) -> bool {
        self.module == other.module && self.symbol == other.symbol
    }
}

impl fmt::Display for ImportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} import {}", self.module, self.symbol)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// One line of an aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRecord {
    Import {
        line: ImportLine,
        indent: String,
        marker: Option<String>,
        /// Statement text as written, trailing comment included.
        statement: String,
        eol: String,
    },
    Other(String),
}

impl ImportRecord {
    fn state(&self) -> Option<EntryState> {
        match self {
            Self::Import { marker: None, .. } => Some(EntryState::Active),
            Self::Import { marker: Some(_), .. } => Some(EntryState::Disabled),
            Self::Other(_) => None,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Self::Import {
                indent,
                marker,
                statement,
                eol,
                ..
            } => {
                out.push_str(indent);
                out.push_str(marker.as_deref().unwrap_or(""));
                out.push_str(statement);
                out.push_str(eol);
            }
            Self::Other(text) => out.push_str(text),
        }
    }
}

/// Result of an import mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportOutcome {
    Added,
    AlreadyPresent,
    /// Present but commented out; left as is.
    PresentDisabled,
    Enabled,
    Disabled,
    AlreadyEnabled,
    AlreadyDisabled,
}

impl ImportOutcome {
    pub fn is_change(self) -> bool {
        matches!(
            self,
            Self::Added | Self::Enabled | Self::Disabled
        )
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::AlreadyPresent => "already present",
            Self::PresentDisabled => "present but commented out",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::AlreadyEnabled => "already enabled",
            Self::AlreadyDisabled => "already disabled",
        })
    }
}

/// Parsed content of one aggregator file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportBlock {
    records: Vec<ImportRecord>,
}

fn split_eol(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

impl ImportBlock {
    pub fn parse(text: &str) -> Self {
        let records = text
            .split_inclusive('\n')
            .map(|raw| {
                let (body, eol) = split_eol(raw);
                let Some(caps) = IMPORT_LINE.captures(body) else {
                    return ImportRecord::Other(raw.to_string());
                };
                let mut line = ImportLine {
                    module: caps["module"].to_string(),
                    symbol: caps["symbol"].to_string(),
                    alias: None,
                };
                if let Some(alias) = caps.name("alias") {
                    line.alias = Some(alias.as_str().to_string());
                }
                ImportRecord::Import {
                    line,
                    indent: caps["indent"].to_string(),
                    marker: caps.name("marker").map(|m| m.as_str().to_string()),
                    statement: caps["stmt"].to_string(),
                    eol: eol.to_string(),
                }
            })
            .collect();
        Self { records }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            record.render(&mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recognised imports with their state, in file order.
    pub fn imports(&self) -> impl Iterator<Item = (&ImportLine, EntryState)> {
        self.records.iter().filter_map(|r| match r {
            ImportRecord::Import { line, .. } => r.state().map(|s| (line, s)),
            ImportRecord::Other(_) => None,
        })
    }

    pub fn state_of(&self, target: &ImportLine) -> Option<EntryState> {
        self.position(target).and_then(|i| self.records[i].state())
    }

    fn position(&self, target: &ImportLine) -> Option<usize> {
        self.records.iter().position(
            |r| matches!(r, ImportRecord::Import { line, .. } if line.same_target(target)),
        )
    }

    /// Append `line` unless the same (module, symbol) pair is already listed.
    pub fn add(&mut self, line: ImportLine, comment: Option<&str>) -> Result<ImportOutcome, DomainError> {
        if let Some(i) = self.position(&line) {
            return Ok(match self.records[i].state() {
                Some(EntryState::Disabled) => ImportOutcome::PresentDisabled,
                _ => ImportOutcome::AlreadyPresent,
            });
        }

        if let Some(name) = line.bound_name() {
            let clash = self.imports().find(|(existing, state)| {
                *state == EntryState::Active
                    && existing.bound_name() == Some(name)
                    && existing.module != line.module
            });
            if let Some((existing, _)) = clash {
                return Err(DomainError::ImportConflict {
                    name: name.to_string(),
                    existing: existing.module.clone(),
                    requested: line.module.clone(),
                });
            }
        }

        let insert_at = self
            .records
            .iter()
            .rposition(|r| matches!(r, ImportRecord::Import { .. }))
            .map_or(self.records.len(), |i| i + 1);

        // the line before the new one must be terminated
        if insert_at > 0 {
            match &mut self.records[insert_at - 1] {
                ImportRecord::Import { eol, .. } if eol.is_empty() => eol.push('\n'),
                ImportRecord::Other(text) if !text.ends_with('\n') => text.push('\n'),
                _ => {}
            }
        }

        let statement = match comment {
            Some(c) => format!("{line}  # {c}"),
            None => line.to_string(),
        };
        self.records.insert(
            insert_at,
            ImportRecord::Import {
                line,
                indent: String::new(),
                marker: None,
                statement,
                eol: "\n".to_string(),
            },
        );
        Ok(ImportOutcome::Added)
    }

    /// Delete the line for `target`, whatever its state. Returns whether a line was removed.
    pub fn remove(&mut self, target: &ImportLine) -> bool {
        match self.position(target) {
            Some(i) => {
                self.records.remove(i);
                true
            }
            None => false,
        }
    }

    /// Comment out `target` in place.
    pub fn disable(&mut self, target: &ImportLine, aggregator: &str) -> Result<ImportOutcome, DomainError> {
        let i = self.require(target, aggregator)?;
        let ImportRecord::Import { marker, .. } = &mut self.records[i] else {
            unreachable!("position() only yields import records");
        };
        if marker.is_some() {
            return Ok(ImportOutcome::AlreadyDisabled);
        }
        *marker = Some("# ".to_string());
        Ok(ImportOutcome::Disabled)
    }

    /// Strip the comment marker from `target` in place.
    pub fn enable(&mut self, target: &ImportLine, aggregator: &str) -> Result<ImportOutcome, DomainError> {
        let i = self.require(target, aggregator)?;
        let ImportRecord::Import { marker, .. } = &mut self.records[i] else {
            unreachable!("position() only yields import records");
        };
        if marker.take().is_none() {
            return Ok(ImportOutcome::AlreadyEnabled);
        }
        Ok(ImportOutcome::Enabled)
    }

    fn require(&self, target: &ImportLine, aggregator: &str) -> Result<usize, DomainError> {
        self.position(target).ok_or_else(|| DomainError::ImportNotFound {
            statement: target.to_string(),
            aggregator: aggregator.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INIT: &str = "\
\"\"\"Serializers.\"\"\"
from .user import UserSerializer
# from .legacy import LegacySerializer
from .order import *  # orders

__all__ = []
";

    fn user() -> ImportLine {
        ImportLine::new(".user", "UserSerializer").unwrap()
    }

    #[test]
    fn classifies_lines() {
        let block = ImportBlock::parse(INIT);
        let imports: Vec<(String, EntryState)> = block
            .imports()
            .map(|(l, s)| (l.to_string(), s))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("from .user import UserSerializer".to_string(), EntryState::Active),
                ("from .legacy import LegacySerializer".to_string(), EntryState::Disabled),
                ("from .order import *".to_string(), EntryState::Active),
            ]
        );
        assert_eq!(block.render(), INIT);
    }

    #[test]
    fn disable_then_enable_restores_exactly() {
        let mut block = ImportBlock::parse(INIT);
        assert_eq!(block.disable(&user(), "__init__.py").unwrap(), ImportOutcome::Disabled);
        assert!(block.render().contains("\n# from .user import UserSerializer\n"));
        assert_eq!(block.enable(&user(), "__init__.py").unwrap(), ImportOutcome::Enabled);
        assert_eq!(block.render(), INIT);
    }

    #[test]
    fn toggling_twice_is_reported() {
        let mut block = ImportBlock::parse(INIT);
        assert_eq!(block.enable(&user(), "x").unwrap(), ImportOutcome::AlreadyEnabled);
        let legacy = ImportLine::new(".legacy", "LegacySerializer").unwrap();
        assert_eq!(block.disable(&legacy, "x").unwrap(), ImportOutcome::AlreadyDisabled);
    }

    #[test]
    fn toggle_missing_import_is_not_found() {
        let mut block = ImportBlock::parse(INIT);
        let err = block
            .disable(&ImportLine::forward("ghost").unwrap(), "shop/serializers/__init__.py")
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::ImportNotFound {
                statement: "from .ghost import *".into(),
                aggregator: "shop/serializers/__init__.py".into(),
            }
        );
    }

    #[test]
    fn add_appends_after_last_import() {
        let mut block = ImportBlock::parse(INIT);
        let outcome = block.add(ImportLine::forward("review").unwrap(), None).unwrap();
        assert_eq!(outcome, ImportOutcome::Added);
        assert!(block
            .render()
            .contains("from .order import *  # orders\nfrom .review import *\n\n__all__"));
    }

    #[test]
    fn add_is_idempotent_and_respects_disabled() {
        let mut block = ImportBlock::parse(INIT);
        assert_eq!(block.add(user(), None).unwrap(), ImportOutcome::AlreadyPresent);
        let legacy = ImportLine::new(".legacy", "LegacySerializer").unwrap();
        assert_eq!(block.add(legacy, None).unwrap(), ImportOutcome::PresentDisabled);
        assert_eq!(block.render(), INIT);
    }

    #[test]
    fn add_refuses_to_rebind_a_name() {
        let mut block = ImportBlock::parse(INIT);
        let other = ImportLine::new(".accounts", "UserSerializer").unwrap();
        let err = block.add(other, None).unwrap_err();
        assert!(matches!(err, DomainError::ImportConflict { ref existing, .. } if existing == ".user"));

        let aliased = ImportLine::new(".accounts", "UserSerializer")
            .unwrap()
            .with_alias("AccountSerializer");
        assert_eq!(block.add(aliased, None).unwrap(), ImportOutcome::Added);
    }

    #[test]
    fn add_to_unterminated_file() {
        let mut block = ImportBlock::parse("from .a import *");
        block.add(ImportLine::forward("b").unwrap(), None).unwrap();
        assert_eq!(block.render(), "from .a import *\nfrom .b import *\n");
    }

    #[test]
    fn add_to_empty_file() {
        let mut block = ImportBlock::parse("");
        block
            .add(ImportLine::forward("review").unwrap(), Some("reviews"))
            .unwrap();
        assert_eq!(block.render(), "from .review import *  # reviews\n");
    }

    #[test]
    fn remove_drops_disabled_lines_too() {
        let mut block = ImportBlock::parse(INIT);
        let legacy = ImportLine::new(".legacy", "LegacySerializer").unwrap();
        assert!(block.remove(&legacy));
        assert!(!block.remove(&legacy));
        assert!(!block.render().contains("legacy"));
        assert_eq!(block.state_of(&legacy), None);
    }

    #[test]
    fn rejects_bad_module_paths() {
        assert!(ImportLine::new("my-module", "X").is_err());
        assert!(ImportLine::new("..pkg.mod", "X").is_ok());
        assert!(ImportLine::new(".", "X").is_ok());
    }
}
