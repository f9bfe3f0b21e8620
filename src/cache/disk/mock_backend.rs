//! Mock disk backend for testing (in-memory HashMap storage)
//!
//! Modification times come from a logical clock that advances on every write
//! and touch, so recency ordering is deterministic.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::backend::{DiskBackend, FileInfo};
use super::error::DiskCacheError;

#[derive(Debug, Clone)]
struct MockFile {
    data: Bytes,
    modified: SystemTime,
}

/// Mock backend that stores files in memory for testing
#[derive(Clone, Default)]
pub struct MockDiskBackend {
    files: Arc<RwLock<HashMap<PathBuf, MockFile>>>,
    clock: Arc<AtomicU64>,
    /// Simulate errors if true
    simulate_permission_denied: Arc<RwLock<bool>>,
    /// Fail only mtime updates, leaving reads and writes working
    simulate_touch_failure: Arc<RwLock<bool>>,
    file_info_calls: Arc<AtomicU64>,
}

impl MockDiskBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable permission denied simulation for testing
    pub fn set_permission_denied(&self, enabled: bool) {
        *self.simulate_permission_denied.write() = enabled;
    }

    /// Make `touch` fail as on a read-only cache directory
    pub fn set_touch_fails(&self, enabled: bool) {
        *self.simulate_touch_failure.write() = enabled;
    }

    /// Number of `file_info` lookups so far
    pub fn file_info_calls(&self) -> u64 {
        self.file_info_calls.load(Ordering::SeqCst)
    }

    /// Get number of stored files
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    /// Insert a file directly, bypassing the cache
    pub fn seed(&self, path: PathBuf, data: Bytes) {
        let modified = self.tick();
        self.files.write().insert(path, MockFile { data, modified });
    }

    fn tick(&self) -> SystemTime {
        let now = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(now)
    }

    fn check_permission(&self) -> Result<(), DiskCacheError> {
        if *self.simulate_permission_denied.read() {
            return Err(DiskCacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "Simulated permission denied",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DiskBackend for MockDiskBackend {
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError> {
        self.check_permission()?;
        self.files
            .read()
            .get(path)
            .map(|file| file.data.clone())
            .ok_or_else(|| {
                DiskCacheError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "File not found",
                ))
            })
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError> {
        self.check_permission()?;
        self.seed(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<(), DiskCacheError> {
        self.check_permission()?;
        self.files.write().remove(path);
        Ok(())
    }

    async fn create_dir_all(&self, _path: &Path) -> Result<(), DiskCacheError> {
        self.check_permission()
    }

    async fn file_info(&self, path: &Path) -> Result<Option<FileInfo>, DiskCacheError> {
        self.file_info_calls.fetch_add(1, Ordering::SeqCst);
        self.check_permission()?;
        Ok(self.files.read().get(path).map(|file| FileInfo {
            path: path.to_path_buf(),
            size: file.data.len() as u64,
            modified: file.modified,
        }))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, DiskCacheError> {
        self.check_permission()?;
        Ok(self
            .files
            .read()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    async fn touch(&self, path: &Path) -> Result<bool, DiskCacheError> {
        self.check_permission()?;
        if *self.simulate_touch_failure.read() {
            return Err(DiskCacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "Simulated read-only file",
            )));
        }
        let modified = self.tick();
        match self.files.write().get_mut(path) {
            Some(file) => {
                file.modified = modified;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
