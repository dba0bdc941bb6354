//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use strata_core::{
    application::{
        ApplicationError,
        ports::{DirEntry, Filesystem},
    },
    error::StrataResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same tree, so a test can keep a handle for inspection
/// after passing one to a service.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFilesystemInner {
    fn insert_dirs(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.directories.contains(parent),
            _ => true,
        }
    }
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    fn read(&self) -> StrataResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?)
    }

    fn write(&self) -> StrataResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?)
    }

    /// Add a file, creating its parent directories (testing helper).
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                inner.insert_dirs(parent);
            }
            inner.files.insert(path.to_path_buf(), content.into());
        }
    }

    /// Add a directory and its parents (testing helper).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.insert_dirs(path.as_ref());
        }
    }

    /// Read a file's content as UTF-8 (testing helper).
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let bytes = inner.files.get(path.as_ref())?;
        String::from_utf8(bytes.clone()).ok()
    }

    /// All file paths, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All directory paths, sorted.
    pub fn list_dirs(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.directories.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(path: &Path, reason: &str) -> ApplicationError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self.write()?;
        if inner.files.contains_key(path) {
            return Err(missing(path, "A file exists at this path").into());
        }
        inner.insert_dirs(path);
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> StrataResult<String> {
        let inner = self.read()?;
        let bytes = inner
            .files
            .get(path)
            .ok_or_else(|| missing(path, "File does not exist"))?;
        String::from_utf8(bytes.clone())
            .map_err(|_| missing(path, "File is not valid UTF-8").into())
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        let mut inner = self.write()?;
        if !inner.parent_exists(path) {
            return Err(missing(path, "Parent directory does not exist").into());
        }
        if inner.directories.contains(path) {
            return Err(missing(path, "A directory exists at this path").into());
        }
        inner.files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        // A single map insert is already all-or-nothing here.
        self.write_file(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> StrataResult<Vec<DirEntry>> {
        let inner = self.read()?;
        if !inner.directories.contains(path) {
            return Err(missing(path, "Directory does not exist").into());
        }
        let child = |p: &PathBuf| p.parent() == Some(path);
        let mut entries: Vec<DirEntry> = inner
            .directories
            .iter()
            .filter(|p| child(*p))
            .map(|p| (p, true))
            .chain(inner.files.keys().filter(|p| child(*p)).map(|p| (p, false)))
            .filter_map(|(p, is_dir)| {
                Some(DirEntry {
                    name: p.file_name()?.to_string_lossy().into_owned(),
                    path: p.clone(),
                    is_dir,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn file_size(&self, path: &Path) -> StrataResult<u64> {
        let inner = self.read()?;
        inner
            .files
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| missing(path, "File does not exist").into())
    }

    fn remove_file(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self.write()?;
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| missing(path, "File does not exist").into())
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self.write()?;
        if !inner.directories.contains(path) {
            return Err(missing(path, "Directory does not exist").into());
        }
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> StrataResult<()> {
        let mut inner = self.write()?;
        if !inner.parent_exists(to) {
            return Err(missing(to, "Parent directory does not exist").into());
        }

        if let Some(content) = inner.files.remove(from) {
            inner.files.insert(to.to_path_buf(), content);
            return Ok(());
        }
        if !inner.directories.contains(from) {
            return Err(missing(from, "Path does not exist").into());
        }
        if inner.directories.contains(to) || inner.files.contains_key(to) {
            return Err(missing(to, "Destination exists").into());
        }

        let moved =
            |p: &Path| -> Option<PathBuf> { p.strip_prefix(from).ok().map(|rest| to.join(rest)) };
        let dirs: Vec<PathBuf> = inner
            .directories
            .iter()
            .filter_map(|p| moved(p.as_path()))
            .collect();
        let files: Vec<(PathBuf, Vec<u8>)> = inner
            .files
            .iter()
            .filter_map(|(p, c)| moved(p.as_path()).map(|np| (np, c.clone())))
            .collect();
        inner.directories.retain(|p| !p.starts_with(from));
        inner.files.retain(|p, _| !p.starts_with(from));
        inner.directories.extend(dirs);
        inner.files.extend(files);
        Ok(())
    }
}
