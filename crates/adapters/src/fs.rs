// SPDX-License-Identifier: MIT

//! Filesystem driver seam

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors from a filesystem driver.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("directory not empty: {0}")]
    NotEmpty(PathBuf),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            _ => FsError::Io { path: path.to_path_buf(), source },
        }
    }
}

/// One listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// The filesystem operations the synchronizer needs.
#[async_trait]
pub trait Filesystem: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError>;
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError>;
    async fn remove_file(&self, path: &Path) -> Result<(), FsError>;
    /// Remove a directory. Fails with [`FsError::NotEmpty`] if it still has
    /// children.
    async fn remove_dir(&self, path: &Path) -> Result<(), FsError>;
    async fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;
    async fn exists(&self, path: &Path) -> bool;
    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;
}

/// Local disk driver backed by `tokio::fs`.
#[derive(Clone, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        tokio::fs::read(path).await.map_err(|e| FsError::io(path, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        tokio::fs::write(path, contents).await.map_err(|e| FsError::io(path, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::remove_file(path).await.map_err(|e| FsError::io(path, e))
    }

    async fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::remove_dir(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty(path.to_path_buf()),
            _ => FsError::io(path, e),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::create_dir_all(path).await.map_err(|e| FsError::io(path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut reader = tokio::fs::read_dir(path).await.map_err(|e| FsError::io(path, e))?;
        let mut entries = Vec::new();
        while let Some(item) = reader.next_entry().await.map_err(|e| FsError::io(path, e))? {
            let is_dir = item
                .file_type()
                .await
                .map_err(|e| FsError::io(&item.path(), e))?
                .is_dir();
            entries.push(DirEntry { path: item.path(), is_dir });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// In-memory filesystem fake with explicit directory tracking.
#[derive(Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<Mutex<MemoryFsState>>,
}

#[derive(Default)]
struct MemoryFsState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// All file paths currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.inner.lock().files.keys().cloned().collect()
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).cloned()
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.inner
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(FsError::NotFound(parent.to_path_buf()));
            }
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        self.inner
            .lock()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    async fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        if !state.dirs.contains(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        let occupied = state.files.keys().any(|p| p.parent() == Some(path))
            || state.dirs.iter().any(|d| d.parent() == Some(path));
        if occupied {
            return Err(FsError::NotEmpty(path.to_path_buf()));
        }
        state.dirs.remove(path);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            state.dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let state = self.inner.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let state = self.inner.lock();
        if !state.dirs.contains(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        let mut entries: Vec<DirEntry> = state
            .files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .map(|p| DirEntry { path: p.clone(), is_dir: false })
            .chain(
                state
                    .dirs
                    .iter()
                    .filter(|d| d.parent() == Some(path))
                    .map(|d| DirEntry { path: d.clone(), is_dir: true }),
            )
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
