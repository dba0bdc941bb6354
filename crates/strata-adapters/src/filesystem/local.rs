//! Local filesystem adapter using std::fs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use strata_core::{
    application::{ApplicationError, ports::DirEntry, ports::Filesystem},
    error::{StrataError, StrataResult},
};
use tracing::debug;
use uuid::Uuid;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn read_to_string(&self, path: &Path) -> StrataResult<String> {
        fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        let temp = temp_sibling(path);
        debug!(path = %path.display(), temp = %temp.display(), "Atomic write");

        // the replacement keeps the mode of the file it replaces
        let permissions = fs::metadata(path).ok().map(|m| m.permissions());
        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(content)?;
            if let Some(permissions) = permissions {
                file.set_permissions(permissions)?;
            }
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(map_io_error(path, e, "write temporary file"));
        }

        fs::rename(&temp, path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            map_io_error(path, e, "replace file")
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> StrataResult<Vec<DirEntry>> {
        let read_dir = fs::read_dir(path).map_err(|e| map_io_error(path, e, "list directory"))?;
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| map_io_error(path, e, "list directory"))?;
            let file_type = entry
                .file_type()
                .map_err(|e| map_io_error(&entry.path(), e, "get metadata"))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn file_size(&self, path: &Path) -> StrataResult<u64> {
        fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| map_io_error(path, e, "get metadata"))
    }

    fn remove_file(&self, path: &Path) -> StrataResult<()> {
        fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }

    fn rename(&self, from: &Path, to: &Path) -> StrataResult<()> {
        fs::rename(from, to).map_err(|e| map_io_error(from, e, "rename"))
    }
}

/// Hidden temporary file in the same directory, so the final rename never
/// crosses a filesystem boundary.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_name = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
    match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StrataError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}
