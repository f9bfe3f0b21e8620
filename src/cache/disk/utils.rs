//! Utility functions for disk cache

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

/// Cache file name for a key: lowercase MD5 hex
pub fn key_to_filename(key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Path of the cache file for a key
pub fn key_to_path(cache_dir: &Path, key: &str) -> PathBuf {
    cache_dir.join(key_to_filename(key))
}
