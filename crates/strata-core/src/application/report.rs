//! Planned and applied filesystem changes, shared by every report.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "path", rename_all = "kebab-case")]
pub enum FileChange {
    CreateDir(PathBuf),
    CreateFile(PathBuf),
    UpdateFile(PathBuf),
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::CreateDir(p)
            | Self::CreateFile(p)
            | Self::UpdateFile(p)
            | Self::RemoveFile(p)
            | Self::RemoveDir(p) => p,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::CreateDir(_) => "create directory",
            Self::CreateFile(_) => "create",
            Self::UpdateFile(_) => "update",
            Self::RemoveFile(_) => "remove",
            Self::RemoveDir(_) => "remove directory",
        }
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.path().display())
    }
}
