//! Cache error types
//!
//! Cache failures never reach the caller of `get_image`/`cache_image`; they
//! are logged and treated as misses. The error type exists for setup
//! (`ImageCache::open`) and for the internal plumbing between tiers.

/// Cache error types
#[derive(Debug)]
pub enum CacheError {
    /// Cache entry not found
    NotFound,
    /// I/O error (for disk cache)
    IoError(std::io::Error),
    /// Cached bytes could not be decoded into an image
    DecodeError(String),
    /// An image could not be encoded for the disk tier
    EncodeError(String),
    /// Configuration error
    ConfigurationError(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "Cache entry not found"),
            CacheError::IoError(err) => write!(f, "I/O error: {}", err),
            CacheError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            CacheError::EncodeError(msg) => write!(f, "Encode error: {}", msg),
            CacheError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::IoError(err)
    }
}

impl From<image::ImageError> for CacheError {
    fn from(err: image::ImageError) -> Self {
        CacheError::DecodeError(err.to_string())
    }
}
