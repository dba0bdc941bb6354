//! Pycache Service - removes `__pycache__` directories below the project root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{application::ports::Filesystem, error::StrataResult};

const PYCACHE: &str = "__pycache__";

/// Directories never descended into.
const SKIPPED: [&str; 4] = [".git", ".venv", "venv", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PycacheDir {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PycacheReport {
    pub directories: Vec<PycacheDir>,
    pub total_bytes: u64,
    pub dry_run: bool,
}

pub struct PycacheService {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
}

impl PycacheService {
    pub fn new(filesystem: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            root: root.into(),
        }
    }

    #[instrument(skip_all, fields(root = %self.root.display(), dry_run = dry_run))]
    pub fn clean(&self, dry_run: bool) -> StrataResult<PycacheReport> {
        let mut found = Vec::new();
        self.collect(&self.root, &mut found)?;

        let mut directories = Vec::new();
        for dir in found {
            let bytes = self.dir_size(&dir)?;
            if !dry_run {
                self.filesystem.remove_dir_all(&dir)?;
                debug!(path = %dir.display(), bytes, "Removed");
            }
            let path = dir.strip_prefix(&self.root).map(Path::to_path_buf).unwrap_or(dir);
            directories.push(PycacheDir { path, bytes });
        }

        let total_bytes = directories.iter().map(|d| d.bytes).sum();
        info!(count = directories.len(), total_bytes, "Pycache cleanup");
        Ok(PycacheReport {
            directories,
            total_bytes,
            dry_run,
        })
    }

    fn collect(&self, dir: &Path, found: &mut Vec<PathBuf>) -> StrataResult<()> {
        for entry in self.filesystem.list_dir(dir)? {
            if !entry.is_dir || SKIPPED.contains(&entry.name.as_str()) {
                continue;
            }
            if entry.name == PYCACHE {
                found.push(entry.path);
            } else {
                self.collect(&entry.path, found)?;
            }
        }
        Ok(())
    }

    fn dir_size(&self, dir: &Path) -> StrataResult<u64> {
        let mut total = 0;
        for entry in self.filesystem.list_dir(dir)? {
            total += if entry.is_dir {
                self.dir_size(&entry.path)?
            } else {
                self.filesystem.file_size(&entry.path)?
            };
        }
        Ok(total)
    }
}
