//! Tokio-based filesystem backend (portable, works on all platforms)

use super::backend::{DiskBackend, FileInfo};
use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension of in-progress atomic writes
pub(crate) const TEMP_EXTENSION: &str = "tmp";

/// Portable filesystem backend using tokio::fs
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFsBackend;

impl TokioFsBackend {
    pub fn new() -> Self {
        Self
    }
}

fn not_found_as_none<T>(result: std::io::Result<T>) -> Result<Option<T>, DiskCacheError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl DiskBackend for TokioFsBackend {
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError> {
        let data = tokio::fs::read(path).await?;
        Ok(Bytes::from(data))
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(TEMP_EXTENSION);
        tokio::fs::write(&temp_path, &data).await?;
        tokio::fs::rename(&temp_path, path).await?;

        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<(), DiskCacheError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), DiskCacheError> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn file_info(&self, path: &Path) -> Result<Option<FileInfo>, DiskCacheError> {
        let Some(metadata) = not_found_as_none(tokio::fs::metadata(path).await)? else {
            return Ok(None);
        };
        Ok(Some(FileInfo {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, DiskCacheError> {
        let mut entries = Vec::new();
        let Some(mut dir) = not_found_as_none(tokio::fs::read_dir(path).await)? else {
            return Ok(entries);
        };
        while let Some(entry) = dir.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type().await?.is_file() {
                entries.push(entry.path());
            }
        }
        Ok(entries)
    }

    async fn touch(&self, path: &Path) -> Result<bool, DiskCacheError> {
        let path = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new().write(true).open(&path)?;
            file.set_modified(SystemTime::now())
        })
        .await
        .map_err(|e| DiskCacheError::TaskFailed(e.to_string()))?;

        Ok(not_found_as_none(result)?.is_some())
    }
}
