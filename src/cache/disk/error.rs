//! Error types for disk cache operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    TaskFailed(String),
}

impl DiskCacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiskCacheError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

// Conversion to CacheError
impl From<DiskCacheError> for crate::cache::CacheError {
    fn from(err: DiskCacheError) -> Self {
        match err {
            DiskCacheError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::cache::CacheError::NotFound
            }
            DiskCacheError::Io(e) => crate::cache::CacheError::IoError(e),
            DiskCacheError::TaskFailed(msg) => crate::cache::CacheError::IoError(
                std::io::Error::new(std::io::ErrorKind::Other, msg),
            ),
        }
    }
}
