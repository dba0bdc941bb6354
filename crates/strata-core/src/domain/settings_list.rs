//! Settings list grammar.
//!
//! A settings file is treated as opaque text except for the named list
//! literals being edited. A list is parsed into [`ListLine`] records: quoted
//! string entries (active, or disabled behind a leading `#`) and everything
//! else, kept verbatim. Only the lines belonging to the edited list are
//! re-rendered; the rest of the file is copied byte-for-byte.
//!
//! ```text
//! PROJECT_APPS = [          <- opener
//!     'accounts',           <- Entry (Active)
//!     # 'billing',          <- Entry (Disabled)
//!     *EXTRA_APPS,          <- Other
//! ]                         <- closer
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::DomainError;

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<indent>\s*)(?P<marker>#\s*)?(?:'(?P<sq>[^']*)'|"(?P<dq>[^"]*)")(?P<rest>.*)$"#)
        .expect("entry regex is valid")
});

static ENTRY_REST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*,?\s*(#.*)?$").expect("rest regex is valid"));

/// The list categories that make up the project app registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingsCategory {
    Project,
    ThirdParty,
    Dev,
}

impl SettingsCategory {
    pub const ALL: [SettingsCategory; 3] = [Self::Project, Self::ThirdParty, Self::Dev];

    /// Name of the list literal in the settings file.
    pub fn list_name(self) -> &'static str {
        match self {
            Self::Project => "PROJECT_APPS",
            Self::ThirdParty => "THIRD_PARTY_PACKAGES",
            Self::Dev => "DEV_APPS",
        }
    }
}

impl fmt::Display for SettingsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.list_name())
    }
}

/// Whether an entry is live or commented out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Active,
    Disabled,
}

/// Requested mutation of one list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOp {
    Add { comment: Option<String> },
    Remove,
    SoftRemove,
    Restore,
}

impl SettingsOp {
    /// Build the operation from mutually exclusive CLI flags.
    pub fn from_flags(
        remove: bool,
        soft_remove: bool,
        restore: bool,
        comment: Option<String>,
    ) -> Result<Self, DomainError> {
        let set: Vec<&'static str> = [
            ("--remove", remove),
            ("--soft-remove", soft_remove),
            ("--restore", restore),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect();

        if set.len() > 1 {
            return Err(DomainError::ConflictingFlags { flags: set });
        }
        if comment.is_some() && !set.is_empty() {
            return Err(DomainError::ConflictingFlags {
                flags: vec!["--comment", set[0]],
            });
        }

        Ok(if remove {
            Self::Remove
        } else if soft_remove {
            Self::SoftRemove
        } else if restore {
            Self::Restore
        } else {
            Self::Add { comment }
        })
    }
}

/// What an edit did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditOutcome {
    Added,
    Reactivated,
    Removed,
    Disabled,
    AlreadyActive,
    AlreadyDisabled,
}

impl EditOutcome {
    /// `false` when the file content is left as it was.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::AlreadyActive | Self::AlreadyDisabled)
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Reactivated => "re-enabled",
            Self::Removed => "removed",
            Self::Disabled => "commented out",
            Self::AlreadyActive => "already active",
            Self::AlreadyDisabled => "already commented out",
        };
        f.write_str(s)
    }
}

/// One quoted string entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsEntry {
    indent: String,
    /// `Some("# ")` when the entry is commented out.
    marker: Option<String>,
    quote: char,
    key: String,
    /// Everything after the closing quote: comma and trailing comment.
    rest: String,
    eol: String,
}

impl SettingsEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> EntryState {
        if self.marker.is_some() {
            EntryState::Disabled
        } else {
            EntryState::Active
        }
    }

    fn quoted(&self) -> String {
        format!("{q}{k}{q}", q = self.quote, k = self.key)
    }

    fn has_comma(&self) -> bool {
        self.rest.trim_start().starts_with(',')
    }

    fn render_line(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.indent,
            self.marker.as_deref().unwrap_or(""),
            self.quoted(),
            self.rest,
            self.eol
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ListLine {
    Entry(SettingsEntry),
    /// Verbatim text: blank lines, comments, spreads such as `*OTHER_APPS,`.
    Other(String),
}

impl ListLine {
    fn is_item(&self) -> bool {
        match self {
            Self::Entry(_) => true,
            Self::Other(text) => {
                let t = text.trim();
                !t.is_empty() && !t.starts_with('#')
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// `NAME = [a, b]` on one line.
    Inline {
        prefix: String,
        suffix: String,
        trailing_comma: bool,
    },
    /// One entry per line between an opener and a closer line.
    Multiline { opener: String, closer: String },
}

/// A parsed list literal plus the byte span it occupies in its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsList {
    name: String,
    span: Range<usize>,
    layout: Layout,
    lines: Vec<ListLine>,
}

impl SettingsList {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Visible entry set, in file order.
    pub fn entries(&self) -> Vec<(&str, EntryState)> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                ListLine::Entry(e) => Some((e.key(), e.state())),
                ListLine::Other(_) => None,
            })
            .collect()
    }

    /// Keys of the active entries.
    pub fn active_keys(&self) -> Vec<&str> {
        self.entries()
            .into_iter()
            .filter(|(_, s)| *s == EntryState::Active)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn state_of(&self, key: &str) -> Option<EntryState> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, s)| s)
    }

    fn position(&self, key: &str) -> Result<Option<usize>, DomainError> {
        let hits: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, ListLine::Entry(e) if e.key == key))
            .map(|(i, _)| i)
            .collect();
        match hits.len() {
            0 => Ok(None),
            1 => Ok(Some(hits[0])),
            count => Err(DomainError::AmbiguousEntry {
                list: self.name.clone(),
                key: key.to_string(),
                count,
            }),
        }
    }

    fn entry_mut(&mut self, index: usize) -> &mut SettingsEntry {
        match &mut self.lines[index] {
            ListLine::Entry(e) => e,
            ListLine::Other(_) => unreachable!("position() only yields entry lines"),
        }
    }

    /// Apply `op` for `key` in place.
    pub fn apply(&mut self, key: &str, op: &SettingsOp) -> Result<EditOutcome, DomainError> {
        let position = self.position(key)?;
        let not_found = || DomainError::EntryNotFound {
            list: self.name.clone(),
            key: key.to_string(),
        };

        match op {
            SettingsOp::Add { comment } => match position {
                Some(i) if self.entry_mut(i).marker.is_none() => Ok(EditOutcome::AlreadyActive),
                Some(i) => {
                    self.entry_mut(i).marker = None;
                    Ok(EditOutcome::Reactivated)
                }
                // already live inside a line the grammar keeps verbatim
                None if self.mentioned_verbatim(key) => Ok(EditOutcome::AlreadyActive),
                None => {
                    self.append(key, comment.as_deref());
                    Ok(EditOutcome::Added)
                }
            },
            SettingsOp::Remove => {
                let i = position.ok_or_else(not_found)?;
                self.lines.remove(i);
                Ok(EditOutcome::Removed)
            }
            SettingsOp::SoftRemove => {
                let i = position.ok_or_else(not_found)?;
                if self.entry_mut(i).marker.is_some() {
                    return Ok(EditOutcome::AlreadyDisabled);
                }
                self.explode();
                if i + 1 == self.lines.len() {
                    // a comment would swallow a closer sharing the line
                    self.detach_closer();
                }
                self.entry_mut(i).marker = Some("# ".to_string());
                Ok(EditOutcome::Disabled)
            }
            SettingsOp::Restore => {
                let i = position.ok_or_else(not_found)?;
                if self.entry_mut(i).marker.is_none() {
                    return Ok(EditOutcome::AlreadyActive);
                }
                self.entry_mut(i).marker = None;
                Ok(EditOutcome::Reactivated)
            }
        }
    }

    fn mentioned_verbatim(&self, key: &str) -> bool {
        let quoted = [format!("'{key}'"), format!("\"{key}\"")];
        self.lines.iter().any(|l| match l {
            ListLine::Other(text) => split_inline_items(code_part(text))
                .0
                .iter()
                .any(|item| quoted.contains(item)),
            ListLine::Entry(_) => false,
        })
    }

    /// Whether the first item shares the opener line (`NAME = ['a',`).
    fn hugs_opener(&self) -> bool {
        matches!(&self.layout, Layout::Multiline { opener, .. } if !opener.ends_with('\n'))
    }

    /// Line ending used by the list's own lines.
    fn eol(&self) -> &'static str {
        let Layout::Multiline { opener, .. } = &self.layout else {
            return "\n";
        };
        if opener.ends_with('\n') {
            return line_ending(opener);
        }
        self.lines
            .iter()
            .find_map(|l| match l {
                ListLine::Entry(e) if !e.eol.is_empty() => Some(line_ending(&e.eol)),
                ListLine::Other(t) if t.ends_with('\n') => Some(line_ending(t)),
                _ => None,
            })
            .unwrap_or("\n")
    }

    /// Give the last line its own line ending when the closer shares it.
    fn detach_closer(&mut self) {
        let eol = self.eol();
        match self.lines.last_mut() {
            Some(ListLine::Entry(e)) if e.eol.is_empty() => e.eol = eol.to_string(),
            Some(ListLine::Other(text)) if !text.ends_with('\n') => text.push_str(eol),
            _ => {}
        }
    }

    fn append(&mut self, key: &str, comment: Option<&str>) {
        let skip_head = usize::from(self.hugs_opener());
        let reference = self.lines.iter().rev().find_map(|l| match l {
            ListLine::Entry(e) => Some(e.clone()),
            ListLine::Other(_) => None,
        });
        let quote = reference.as_ref().map_or('\'', |e| e.quote);
        let indent_from = self.lines.iter().skip(skip_head).rev().find_map(|l| match l {
            ListLine::Entry(e) => Some(e.indent.clone()),
            ListLine::Other(_) => None,
        });

        let mut entry = SettingsEntry {
            indent: String::new(),
            marker: None,
            quote,
            key: key.to_string(),
            rest: String::new(),
            eol: String::new(),
        };

        match &self.layout {
            Layout::Inline { .. } => {
                self.lines.push(ListLine::Entry(entry));
                if let Some(comment) = comment {
                    // an inline list has nowhere to keep a comment
                    self.explode();
                    if let Some(ListLine::Entry(last)) = self.lines.last_mut() {
                        last.rest = format!(",  # {comment}");
                    }
                }
            }
            Layout::Multiline { opener, .. } => {
                entry.indent = match indent_from {
                    Some(indent) => indent,
                    None => format!("{}    ", leading_ws(opener)),
                };
                entry.rest = match comment {
                    Some(c) => format!(",  # {c}"),
                    None => ",".to_string(),
                };
                entry.eol = self.eol().to_string();
                self.detach_closer();

                let insert_at = match self.lines.iter().rposition(ListLine::is_item) {
                    Some(i) => {
                        ensure_trailing_comma(&mut self.lines[i]);
                        i + 1
                    }
                    None => self.lines.len(),
                };
                self.lines.insert(insert_at, ListLine::Entry(entry));
            }
        }
    }

    /// Turn an inline list into the one-entry-per-line form.
    fn explode(&mut self) {
        let Layout::Inline { prefix, suffix, .. } = &self.layout else {
            return;
        };
        let eol = line_ending(suffix).to_string();
        let indent = leading_ws(prefix).to_string();
        let opener = format!("{}{eol}", prefix.trim_end());
        let closer = format!("{indent}{}", suffix.trim_start());
        let item_indent = format!("{indent}    ");

        for line in &mut self.lines {
            match line {
                ListLine::Entry(e) => {
                    e.indent = item_indent.clone();
                    e.rest = ",".to_string();
                    e.eol = eol.clone();
                }
                ListLine::Other(text) => {
                    *text = format!("{item_indent}{},{eol}", text.trim());
                }
            }
        }
        self.layout = Layout::Multiline { opener, closer };
    }

    fn render(&self) -> String {
        match &self.layout {
            Layout::Inline {
                prefix,
                suffix,
                trailing_comma,
            } => {
                let items: Vec<String> = self
                    .lines
                    .iter()
                    .map(|l| match l {
                        ListLine::Entry(e) => e.quoted(),
                        ListLine::Other(t) => t.trim().to_string(),
                    })
                    .collect();
                let comma = if *trailing_comma && !items.is_empty() {
                    ","
                } else {
                    ""
                };
                format!("{prefix}{}{comma}{suffix}", items.join(", "))
            }
            Layout::Multiline { opener, closer } => {
                let mut out = opener.clone();
                for line in &self.lines {
                    match line {
                        ListLine::Entry(e) => out.push_str(&e.render_line()),
                        ListLine::Other(t) => out.push_str(t),
                    }
                }
                out.push_str(closer);
                out
            }
        }
    }
}

fn leading_ws(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
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

fn ensure_trailing_comma(line: &mut ListLine) {
    match line {
        ListLine::Entry(e) if !e.has_comma() => e.rest = format!(",{}", e.rest),
        ListLine::Other(text) => {
            let (body, eol) = split_eol(text);
            if !body.contains('#') && !body.trim_end().ends_with(',') {
                *text = format!("{},{eol}", body.trim_end());
            }
        }
        _ => {}
    }
}

fn parse_entry_line(line: &str) -> ListLine {
    let (body, eol) = split_eol(line);
    let Some(caps) = ENTRY_LINE.captures(body) else {
        return ListLine::Other(line.to_string());
    };
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    if !ENTRY_REST.is_match(rest) {
        return ListLine::Other(line.to_string());
    }
    let (quote, key) = match (caps.name("sq"), caps.name("dq")) {
        (Some(k), _) => ('\'', k.as_str()),
        (_, Some(k)) => ('"', k.as_str()),
        _ => return ListLine::Other(line.to_string()),
    };
    ListLine::Entry(SettingsEntry {
        indent: caps["indent"].to_string(),
        marker: caps.name("marker").map(|m| m.as_str().to_string()),
        quote,
        key: key.to_string(),
        rest: rest.to_string(),
        eol: eol.to_string(),
    })
}

/// `text` up to its first unquoted `#`.
fn code_part(text: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '#') => return &text[..i],
            _ => {}
        }
    }
    text
}

/// Split the inside of `[...]` on commas that are not inside quotes.
fn split_inline_items(inner: &str) -> (Vec<String>, bool) {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (None, ',') => items.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }
    let trailing_comma = current.trim().is_empty() && !items.is_empty();
    if !current.trim().is_empty() {
        items.push(current);
    }
    let items = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (items, trailing_comma)
}

/// Index of the `]` that closes the list, scanning `text` with `depth`
/// brackets already open inside it. Quoted text and comments are skipped.
fn closing_bracket(text: &str, depth: &mut usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '#') => return None,
            (None, '[') => *depth += 1,
            (None, ']') if *depth == 0 => return Some(i),
            (None, ']') => *depth -= 1,
            _ => {}
        }
    }
    None
}

/// A settings source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDocument {
    text: String,
}

impl SettingsDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Locate and parse the list literal `name`.
    pub fn list(&self, name: &str) -> Result<SettingsList, DomainError> {
        let opener_re = Regex::new(&format!(r"^\s*{}\s*(?::[^=]*)?=\s*\[", regex::escape(name)))
            .map_err(|e| DomainError::InvalidName {
                kind: "list name",
                value: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut offset = 0;
        let mut lines = self.text.split_inclusive('\n');
        while let Some(line) = lines.next() {
            let start = offset;
            offset += line.len();
            let Some(m) = opener_re.find(line) else {
                continue;
            };

            let after = &line[m.end()..];
            let mut depth = 0;
            if let Some(close) = closing_bracket(after, &mut depth) {
                let (items, trailing_comma) = split_inline_items(&after[..close]);
                return Ok(SettingsList {
                    name: name.to_string(),
                    span: start..offset,
                    layout: Layout::Inline {
                        prefix: line[..m.end()].to_string(),
                        suffix: after[close..].to_string(),
                        trailing_comma,
                    },
                    lines: items
                        .into_iter()
                        .map(|item| match parse_entry_line(&item) {
                            ListLine::Entry(e) if e.marker.is_none() => ListLine::Entry(e),
                            _ => ListLine::Other(item),
                        })
                        .collect(),
                });
            }

            // `NAME = ['a',` keeps its first item on the opener line
            let mut opener = line.to_string();
            let mut body = Vec::new();
            if !after.trim().is_empty() {
                opener = line[..m.end()].to_string();
                body.push(parse_entry_line(after));
            }

            for inner in lines.by_ref() {
                offset += inner.len();
                let Some(close) = closing_bracket(inner, &mut depth) else {
                    body.push(parse_entry_line(inner));
                    continue;
                };
                // `    'billing']` carries its last item on the closer line
                let (item, closer) = inner.split_at(close);
                let closer = if item.trim().is_empty() {
                    inner
                } else {
                    body.push(parse_entry_line(item));
                    closer
                };
                return Ok(SettingsList {
                    name: name.to_string(),
                    span: start..offset,
                    layout: Layout::Multiline {
                        opener,
                        closer: closer.to_string(),
                    },
                    lines: body,
                });
            }
            return Err(DomainError::UnterminatedList {
                list: name.to_string(),
            });
        }

        Err(DomainError::ListNotFound {
            list: name.to_string(),
        })
    }

    /// Apply `op` for `key` to list `name`, returning the rewritten document.
    pub fn edit(
        &self,
        name: &str,
        key: &str,
        op: &SettingsOp,
    ) -> Result<(EditOutcome, SettingsDocument), DomainError> {
        let mut list = self.list(name)?;
        let outcome = list.apply(key, op)?;
        if !outcome.is_change() {
            return Ok((outcome, self.clone()));
        }
        let mut text = String::with_capacity(self.text.len() + 64);
        text.push_str(&self.text[..list.span.start]);
        text.push_str(&list.render());
        text.push_str(&self.text[list.span.end..]);
        Ok((outcome, SettingsDocument { text }))
    }
}

/// Union of the category lists of one settings file.
#[derive(Debug, Clone)]
pub struct ProjectAppRegistry {
    lists: Vec<(SettingsCategory, SettingsList)>,
}

impl ProjectAppRegistry {
    /// Parse every category list that is present in `doc`.
    pub fn from_document(doc: &SettingsDocument) -> Result<Self, DomainError> {
        let mut lists = Vec::new();
        for category in SettingsCategory::ALL {
            match doc.list(category.list_name()) {
                Ok(list) => lists.push((category, list)),
                Err(DomainError::ListNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Self { lists })
    }

    /// Category holding `key` as an active entry, if any.
    pub fn category_of(&self, key: &str) -> Option<SettingsCategory> {
        self.lists
            .iter()
            .find(|(_, list)| list.state_of(key) == Some(EntryState::Active))
            .map(|(c, _)| *c)
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.category_of(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETTINGS: &str = "\
# header comment
THIRD_PARTY_PACKAGES = [
    \"rest_framework\",     # APIs
    # \"silk\",
    'djoser',  # Auth package
]

PROJECT_APPS = [
    'accounts',
    \"utils\",
]

INSTALLED_APPS = [
    *THIRD_PARTY_PACKAGES,
    *PROJECT_APPS,
]
";

    fn doc() -> SettingsDocument {
        SettingsDocument::new(SETTINGS)
    }

    #[test]
    fn parses_entries_and_states() {
        let list = doc().list("THIRD_PARTY_PACKAGES").unwrap();
        assert_eq!(
            list.entries(),
            vec![
                ("rest_framework", EntryState::Active),
                ("silk", EntryState::Disabled),
                ("djoser", EntryState::Active),
            ]
        );
    }

    #[test]
    fn add_appends_with_existing_style() {
        let (outcome, out) = doc().edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None }).unwrap();
        assert_eq!(outcome, EditOutcome::Added);
        assert!(out.text().contains("    \"utils\",\n    \"shop\",\n]"));
    }

    #[test]
    fn add_is_idempotent_for_active_key() {
        let (outcome, out) = doc()
            .edit("PROJECT_APPS", "accounts", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::AlreadyActive);
        assert_eq!(out.text(), SETTINGS);
    }

    #[test]
    fn add_reactivates_disabled_entry_in_place() {
        let (outcome, out) = doc()
            .edit("THIRD_PARTY_PACKAGES", "silk", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::Reactivated);
        assert!(out.text().contains("# APIs\n    \"silk\",\n    'djoser'"));
    }

    #[test]
    fn add_with_comment() {
        let op = SettingsOp::Add {
            comment: Some("Shop front".into()),
        };
        let (_, out) = doc().edit("PROJECT_APPS", "shop", &op).unwrap();
        assert!(out.text().contains("    \"shop\",  # Shop front\n]"));
    }

    #[test]
    fn add_then_remove_round_trips() {
        let (_, added) = doc().edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None }).unwrap();
        let (outcome, removed) = added.edit("PROJECT_APPS", "shop", &SettingsOp::Remove).unwrap();
        assert_eq!(outcome, EditOutcome::Removed);
        assert_eq!(removed.text(), SETTINGS);
    }

    #[test]
    fn soft_remove_then_restore_keeps_visible_set() {
        let before = doc().list("PROJECT_APPS").unwrap().entries().len();
        let (outcome, soft) = doc().edit("PROJECT_APPS", "accounts", &SettingsOp::SoftRemove).unwrap();
        assert_eq!(outcome, EditOutcome::Disabled);
        assert!(soft.text().contains("    # 'accounts',\n"));
        assert_eq!(
            soft.list("PROJECT_APPS").unwrap().state_of("accounts"),
            Some(EntryState::Disabled)
        );

        let (outcome, restored) = soft.edit("PROJECT_APPS", "accounts", &SettingsOp::Restore).unwrap();
        assert_eq!(outcome, EditOutcome::Reactivated);
        assert_eq!(restored.text(), SETTINGS);
        assert_eq!(restored.list("PROJECT_APPS").unwrap().entries().len(), before);
    }

    #[test]
    fn soft_remove_of_disabled_entry_is_noop() {
        let (outcome, out) = doc()
            .edit("THIRD_PARTY_PACKAGES", "silk", &SettingsOp::SoftRemove)
            .unwrap();
        assert_eq!(outcome, EditOutcome::AlreadyDisabled);
        assert_eq!(out.text(), SETTINGS);
    }

    #[test]
    fn remove_missing_key_is_not_found() {
        let err = doc().edit("PROJECT_APPS", "ghost", &SettingsOp::Remove).unwrap_err();
        assert!(matches!(err, DomainError::EntryNotFound { .. }));
    }

    #[test]
    fn missing_list_is_not_found() {
        let err = doc().list("DEV_APPS").unwrap_err();
        assert_eq!(
            err,
            DomainError::ListNotFound {
                list: "DEV_APPS".into()
            }
        );
    }

    #[test]
    fn duplicate_key_is_ambiguous() {
        let text = "PROJECT_APPS = [\n    'shop',\n    # 'shop',\n]\n";
        let err = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "shop", &SettingsOp::Remove)
            .unwrap_err();
        assert!(matches!(err, DomainError::AmbiguousEntry { count: 2, .. }));
    }

    #[test]
    fn unterminated_list_is_reported() {
        let err = SettingsDocument::new("PROJECT_APPS = [\n    'a',\n")
            .list("PROJECT_APPS")
            .unwrap_err();
        assert!(matches!(err, DomainError::UnterminatedList { .. }));
    }

    #[test]
    fn inline_list_add_stays_inline() {
        let text = "PROJECT_APPS = [\"accounts\", \"billing\"]\nOTHER = 1\n";
        let (outcome, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::Added);
        assert_eq!(
            out.text(),
            "PROJECT_APPS = [\"accounts\", \"billing\", \"shop\"]\nOTHER = 1\n"
        );
        assert_eq!(
            out.list("PROJECT_APPS").unwrap().active_keys(),
            vec!["accounts", "billing", "shop"]
        );
    }

    #[test]
    fn inline_list_soft_remove_explodes() {
        let text = "PROJECT_APPS = ['a', 'b']\n";
        let (_, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "a", &SettingsOp::SoftRemove)
            .unwrap();
        assert_eq!(out.text(), "PROJECT_APPS = [\n    # 'a',\n    'b',\n]\n");
    }

    #[test]
    fn empty_multiline_list_gets_indented_entry() {
        let text = "PROJECT_APPS = [\n]\n";
        let (_, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(out.text(), "PROJECT_APPS = [\n    'shop',\n]\n");
    }

    #[test]
    fn missing_trailing_comma_is_fixed_before_append() {
        let text = "PROJECT_APPS = [\n    'a'\n]\n";
        let (_, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "b", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(out.text(), "PROJECT_APPS = [\n    'a',\n    'b',\n]\n");
    }

    #[test]
    fn commented_opener_is_ignored() {
        let text = "# PROJECT_APPS = [\nPROJECT_APPS = [\n    'a',\n]\n";
        let list = SettingsDocument::new(text).list("PROJECT_APPS").unwrap();
        assert_eq!(list.active_keys(), vec!["a"]);
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        assert!(matches!(
            SettingsOp::from_flags(true, true, false, None),
            Err(DomainError::ConflictingFlags { .. })
        ));
        assert_eq!(
            SettingsOp::from_flags(false, false, true, None).unwrap(),
            SettingsOp::Restore
        );
    }

    #[test]
    fn closer_sharing_the_last_entry_line_ends_the_list() {
        let text = "PROJECT_APPS = [\n    'accounts',\n    'billing']\n\nINSTALLED_APPS = [\n    *PROJECT_APPS,\n]\n";
        let doc = SettingsDocument::new(text);
        assert_eq!(
            doc.list("PROJECT_APPS").unwrap().active_keys(),
            vec!["accounts", "billing"]
        );

        let (outcome, out) = doc
            .edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::Added);
        assert_eq!(
            out.text(),
            "PROJECT_APPS = [\n    'accounts',\n    'billing',\n    'shop',\n]\n\nINSTALLED_APPS = [\n    *PROJECT_APPS,\n]\n"
        );
    }

    #[test]
    fn soft_remove_moves_a_shared_closer_to_its_own_line() {
        let text = "PROJECT_APPS = [\n    'accounts',\n    'billing']\n";
        let (_, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "billing", &SettingsOp::SoftRemove)
            .unwrap();
        assert_eq!(out.text(), "PROJECT_APPS = [\n    'accounts',\n    # 'billing'\n]\n");
    }

    #[test]
    fn entry_on_the_opener_line_is_parsed() {
        let text = "PROJECT_APPS = ['accounts',\n    'billing',\n]\n";
        let doc = SettingsDocument::new(text);
        assert_eq!(
            doc.list("PROJECT_APPS").unwrap().active_keys(),
            vec!["accounts", "billing"]
        );

        let (outcome, out) = doc
            .edit("PROJECT_APPS", "accounts", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::AlreadyActive);
        assert_eq!(out.text(), text);

        let (_, out) = doc
            .edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(
            out.text(),
            "PROJECT_APPS = ['accounts',\n    'billing',\n    'shop',\n]\n"
        );
    }

    #[test]
    fn lone_opener_entry_gets_a_default_indent() {
        let text = "PROJECT_APPS = ['accounts',\n]\n";
        let (_, out) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "shop", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(out.text(), "PROJECT_APPS = ['accounts',\n    'shop',\n]\n");
    }

    #[test]
    fn key_inside_a_verbatim_line_counts_as_active() {
        let text = "PROJECT_APPS = [\n    'accounts', 'billing',\n]\n";
        let (outcome, _) = SettingsDocument::new(text)
            .edit("PROJECT_APPS", "billing", &SettingsOp::Add { comment: None })
            .unwrap();
        assert_eq!(outcome, EditOutcome::AlreadyActive);
    }

    #[test]
    fn nested_brackets_do_not_close_the_list() {
        let text = "PROJECT_APPS = [\n    *['a', 'b'],\n    'c',\n]\nOTHER = [\n]\n";
        let list = SettingsDocument::new(text).list("PROJECT_APPS").unwrap();
        assert_eq!(list.active_keys(), vec!["c"]);
    }

    #[test]
    fn registry_spans_categories() {
        let registry = ProjectAppRegistry::from_document(&doc()).unwrap();
        assert_eq!(registry.category_of("accounts"), Some(SettingsCategory::Project));
        assert_eq!(registry.category_of("djoser"), Some(SettingsCategory::ThirdParty));
        assert!(!registry.is_registered("silk"));
        assert!(!registry.is_registered("shop"));
    }
}
