//! Backend trait for filesystem operations

use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Size and recency of one cached file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Abstraction over filesystem operations so the disk tier can run against
/// an in-memory backend in tests
#[async_trait]
pub trait DiskBackend: Send + Sync {
    /// Read entire file contents
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError>;

    /// Write file contents atomically (using temp file + rename)
    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError>;

    /// Delete a file; deleting a missing file is not an error
    async fn delete_file(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Create directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Size and modification time; `None` when the file does not exist
    async fn file_info(&self, path: &Path) -> Result<Option<FileInfo>, DiskCacheError>;

    /// List the regular, non-hidden files of a directory. A missing
    /// directory lists as empty.
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, DiskCacheError>;

    /// Set the modification time to now. Returns `false` when the file does
    /// not exist.
    async fn touch(&self, path: &Path) -> Result<bool, DiskCacheError>;
}
