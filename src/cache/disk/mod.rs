//! Disk tier
//!
//! One directory per named cache, one file per entry named by the MD5 hex of
//! the key. File modification times encode recency: reads and memory hits
//! touch the file, eviction deletes the least recently modified files first.
//!
//! `DiskStore` is not synchronized itself; `ImageCache` keeps it behind an
//! async mutex so all disk mutations of one cache run one at a time.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use self::backend::{DiskBackend, FileInfo};
pub use self::error::DiskCacheError;
pub use self::tokio_backend::TokioFsBackend;

pub mod backend;
mod error;
pub mod tokio_backend;
mod utils;

pub use utils::key_to_filename;

#[cfg(test)]
pub(crate) mod mock_backend;


pub(crate) struct DiskStore {
    backend: Arc<dyn DiskBackend>,
    dir: PathBuf,
    used_bytes: u64,
    max_capacity: u64,
    threshold: f64,
}

impl DiskStore {
    /// Open the store and account for files left by earlier runs. Stale
    /// temp files from interrupted writes are removed.
    pub async fn open(
        backend: Arc<dyn DiskBackend>,
        dir: PathBuf,
        max_capacity: u64,
        threshold: f64,
    ) -> Result<Self, DiskCacheError> {
        let mut store = Self {
            backend,
            dir,
            used_bytes: 0,
            max_capacity,
            threshold,
        };
        store.used_bytes = store.calculate_used_bytes().await?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    fn path_for(&self, key: &str) -> PathBuf {
        utils::key_to_path(&self.dir, key)
    }

    fn is_temp(path: &Path) -> bool {
        path.extension()
            .map_or(false, |ext| ext == tokio_backend::TEMP_EXTENSION)
    }

    /// Files that belong to the cache, with size and recency
    async fn entries(&self) -> Result<Vec<FileInfo>, DiskCacheError> {
        let mut entries = Vec::new();
        for path in self.backend.read_dir(&self.dir).await? {
            if Self::is_temp(&path) {
                continue;
            }
            if let Some(info) = self.backend.file_info(&path).await? {
                entries.push(info);
            }
        }
        Ok(entries)
    }

    async fn calculate_used_bytes(&self) -> Result<u64, DiskCacheError> {
        let mut used = 0;
        for path in self.backend.read_dir(&self.dir).await? {
            if Self::is_temp(&path) {
                self.backend.delete_file(&path).await?;
                continue;
            }
            if let Some(info) = self.backend.file_info(&path).await? {
                used += info.size;
            }
        }
        Ok(used)
    }

    pub async fn contains(&self, key: &str) -> Result<bool, DiskCacheError> {
        Ok(self.backend.file_info(&self.path_for(key)).await?.is_some())
    }

    /// Read an entry and mark it as recently used. A failed mtime update
    /// still returns the data.
    pub async fn read(&self, key: &str) -> Result<Option<Bytes>, DiskCacheError> {
        let path = self.path_for(key);
        match self.backend.read_file(&path).await {
            Ok(data) => {
                if let Err(e) = self.backend.touch(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to refresh cache entry mtime"
                    );
                }
                Ok(Some(data))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Mark an entry as recently used. A missing file is not an error.
    pub async fn touch(&self, key: &str) -> Result<bool, DiskCacheError> {
        self.backend.touch(&self.path_for(key)).await
    }

    /// Write an entry, replacing any previous one, then evict if over
    /// capacity. Returns the number of evicted files.
    pub async fn write(&mut self, key: &str, data: Bytes) -> Result<usize, DiskCacheError> {
        let path = self.path_for(key);
        let previous = self
            .backend
            .file_info(&path)
            .await?
            .map_or(0, |info| info.size);
        let size = data.len() as u64;

        self.backend.create_dir_all(&self.dir).await?;
        self.backend.write_file_atomic(&path, data).await?;
        self.used_bytes = self.used_bytes.saturating_sub(previous) + size;

        self.evict_if_needed().await
    }

    /// Remove an entry. Returns `false` if there was nothing to remove.
    pub async fn remove(&mut self, key: &str) -> Result<bool, DiskCacheError> {
        let path = self.path_for(key);
        let Some(info) = self.backend.file_info(&path).await? else {
            return Ok(false);
        };
        self.backend.delete_file(&path).await?;
        self.used_bytes = self.used_bytes.saturating_sub(info.size);
        Ok(true)
    }

    /// Change the capacity and evict down to it if needed
    pub async fn set_max_capacity(&mut self, max_capacity: u64) -> Result<usize, DiskCacheError> {
        self.max_capacity = max_capacity;
        self.evict_if_needed().await
    }

    /// Once usage reaches capacity, delete least recently modified files
    /// until usage is at most `capacity * threshold`
    pub async fn evict_if_needed(&mut self) -> Result<usize, DiskCacheError> {
        if self.used_bytes < self.max_capacity {
            return Ok(0);
        }

        let target = (self.max_capacity as f64 * self.threshold) as u64;
        let mut entries = self.entries().await?;
        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

        let mut evicted = 0;
        for entry in entries {
            if self.used_bytes <= target {
                break;
            }
            self.backend.delete_file(&entry.path).await?;
            self.used_bytes = self.used_bytes.saturating_sub(entry.size);
            evicted += 1;
            tracing::debug!(
                path = %entry.path.display(),
                size = entry.size,
                used_bytes = self.used_bytes,
                "Evicted cached file"
            );
        }

        Ok(evicted)
    }
}
