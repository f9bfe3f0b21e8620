//! Two-tier image cache
//!
//! Images fetched from delivery URLs are kept in a cost-bounded memory tier
//! and, depending on the policy, in a capacity-bounded directory on disk.
//! Entries are keyed by the source URL.
//!
//! Lookups check memory first and fall back to disk; a disk hit is decoded
//! and promoted back into memory. Cache failures are never surfaced to
//! callers of [`ImageCache::get_image`] or [`ImageCache::cache_image`]: they
//! are logged and treated as misses.

use bytes::Bytes;
use image::DynamicImage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CacheSettings;

pub mod disk;
mod error;
mod memory;
mod stats;

pub use disk::{DiskBackend, DiskCacheError, FileInfo, TokioFsBackend};
pub use error::CacheError;
pub use stats::CacheStats;

use disk::DiskStore;
use memory::MemoryTier;
use stats::CacheStatsTracker;

/// Which tiers newly cached images go to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Nothing is cached
    None,
    /// Memory tier only
    Memory,
    /// Memory and disk tiers
    #[default]
    Disk,
}

impl CachePolicy {
    fn uses_memory(self) -> bool {
        matches!(self, CachePolicy::Memory | CachePolicy::Disk)
    }

    fn uses_disk(self) -> bool {
        self == CachePolicy::Disk
    }
}

/// A decoded image together with its display scale
#[derive(Clone)]
pub struct CachedImage {
    image: Arc<DynamicImage>,
    scale: f32,
}

impl CachedImage {
    pub fn new(image: DynamicImage, scale: f32) -> Self {
        Self {
            image: Arc::new(image),
            scale,
        }
    }

    /// Decode encoded image bytes (PNG, JPEG, WebP, GIF)
    pub fn decode(data: &[u8], scale: f32) -> Result<Self, CacheError> {
        Ok(Self::new(image::load_from_memory(data)?, scale))
    }

    /// Encode as PNG, the format used for disk entries without raw bytes
    pub fn encode_png(&self) -> Result<Vec<u8>, CacheError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .map_err(|e| CacheError::EncodeError(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Memory cost: `width × scale × height × scale`
    pub fn cost(&self) -> u64 {
        let scale = f64::from(self.scale);
        let cost = (f64::from(self.width()) * scale) * (f64::from(self.height()) * scale);
        cost.round() as u64
    }
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("scale", &self.scale)
            .finish()
    }
}

/// Image cache with a memory tier and a disk tier
pub struct ImageCache {
    name: String,
    policy: RwLock<CachePolicy>,
    memory: MemoryTier,
    disk: Arc<tokio::sync::Mutex<DiskStore>>,
    stats: Arc<CacheStatsTracker>,
}

impl ImageCache {
    /// Open the cache described by `settings` on the local filesystem
    pub async fn open(settings: &CacheSettings) -> Result<Self, CacheError> {
        Self::with_backend(settings, Arc::new(TokioFsBackend::new())).await
    }

    /// Open a cache on a custom disk backend
    pub async fn with_backend(
        settings: &CacheSettings,
        backend: Arc<dyn DiskBackend>,
    ) -> Result<Self, CacheError> {
        settings
            .validate()
            .map_err(|e| CacheError::ConfigurationError(e.to_string()))?;

        let stats = Arc::new(CacheStatsTracker::new());
        let mut store = DiskStore::open(
            backend,
            settings.cache_dir(),
            settings.max_disk_capacity(),
            settings.eviction_threshold,
        )
        .await?;

        let evicted = store.evict_if_needed().await?;
        stats.add_disk_evictions(evicted as u64);

        tracing::info!(
            name = %settings.name,
            dir = %store.dir().display(),
            used_disk_bytes = store.used_bytes(),
            max_disk_capacity = store.max_capacity(),
            evicted,
            "Image cache opened"
        );

        Ok(Self {
            name: settings.name.clone(),
            policy: RwLock::new(settings.policy),
            memory: MemoryTier::new(settings.max_memory_cost(), stats.clone()),
            disk: Arc::new(tokio::sync::Mutex::new(store)),
            stats,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn dir(&self) -> PathBuf {
        self.disk.lock().await.dir().to_path_buf()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        *self.policy.read()
    }

    /// Change the policy for future writes. Existing entries stay.
    pub fn set_cache_policy(&self, policy: CachePolicy) {
        *self.policy.write() = policy;
    }

    /// Whether either tier holds an entry for `key`
    pub async fn has_cached_image(&self, key: &str) -> bool {
        if self.memory.contains(key) {
            return true;
        }
        let store = self.disk.lock().await;
        match store.contains(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Disk cache lookup failed");
                false
            }
        }
    }

    /// Look up an image, promoting disk hits into memory
    pub async fn get_image(&self, key: &str) -> Option<CachedImage> {
        if let Some(image) = self.memory.get(key) {
            self.stats.increment_memory_hits();
            tracing::debug!(key = %key, "Memory cache hit");
            self.touch_in_background(key);
            return Some(image);
        }

        let data = {
            let store = self.disk.lock().await;
            store.read(key).await
        };

        let data = match data {
            Ok(Some(data)) => data,
            Ok(None) => {
                self.stats.increment_misses();
                tracing::debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                self.stats.increment_misses();
                tracing::warn!(key = %key, error = %e, "Disk cache read failed");
                return None;
            }
        };

        let image = match decode_blocking(data).await {
            Ok(image) => image,
            Err(e) => {
                self.stats.increment_misses();
                tracing::warn!(key = %key, error = %e, "Cached image could not be decoded");
                return None;
            }
        };

        self.stats.increment_disk_hits();
        tracing::debug!(key = %key, "Disk cache hit");

        if self.cache_policy().uses_memory() {
            self.memory.insert(key, image.clone());
        }
        Some(image)
    }

    /// Store an image under `key`.
    ///
    /// With the `Disk` policy the raw bytes are written as-is when given,
    /// otherwise the image is re-encoded as PNG.
    pub async fn cache_image(&self, image: CachedImage, raw: Option<Bytes>, key: &str) {
        let policy = self.cache_policy();
        if policy.uses_memory() {
            self.memory.insert(key, image.clone());
        }
        if !policy.uses_disk() {
            return;
        }

        let data = match raw {
            Some(raw) => raw,
            None => match encode_blocking(image).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Image could not be encoded for disk cache");
                    return;
                }
            },
        };

        let mut store = self.disk.lock().await;
        match store.write(key, data).await {
            Ok(evicted) => {
                self.stats.add_disk_evictions(evicted as u64);
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        used_disk_bytes = store.used_bytes(),
                        "Disk cache eviction"
                    );
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Disk cache write failed"),
        }
    }

    /// Remove `key` from both tiers
    pub async fn remove_image(&self, key: &str) {
        self.memory.remove(key);
        let mut store = self.disk.lock().await;
        if let Err(e) = store.remove(key).await {
            tracing::warn!(key = %key, error = %e, "Disk cache remove failed");
        }
    }

    /// Drop every memory entry. The disk tier is untouched.
    pub fn clear_memory(&self) {
        self.memory.clear();
        tracing::debug!(name = %self.name, "Memory cache cleared");
    }

    pub fn max_memory_cost(&self) -> u64 {
        self.memory.max_cost()
    }

    /// Change the memory limit. Current memory entries are dropped.
    pub fn set_max_memory_cost(&self, max_cost: u64) {
        self.memory.set_max_cost(max_cost);
    }

    pub async fn max_disk_capacity(&self) -> u64 {
        self.disk.lock().await.max_capacity()
    }

    /// Change the disk capacity, evicting if usage now exceeds it
    pub async fn set_max_disk_capacity(&self, capacity: u64) {
        let mut store = self.disk.lock().await;
        match store.set_max_capacity(capacity).await {
            Ok(evicted) => self.stats.add_disk_evictions(evicted as u64),
            Err(e) => tracing::warn!(error = %e, "Disk cache eviction failed"),
        }
    }

    pub async fn used_disk_bytes(&self) -> u64 {
        self.disk.lock().await.used_bytes()
    }

    pub async fn stats(&self) -> CacheStats {
        self.memory.run_pending_tasks();
        let (used_disk_bytes, max_disk_capacity) = {
            let store = self.disk.lock().await;
            (store.used_bytes(), store.max_capacity())
        };
        CacheStats {
            memory_cost: self.memory.weighted_size(),
            memory_entry_count: self.memory.entry_count(),
            max_memory_cost: self.memory.max_cost(),
            used_disk_bytes,
            max_disk_capacity,
            ..self.stats.snapshot()
        }
    }

    fn touch_in_background(&self, key: &str) {
        let disk = self.disk.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let store = disk.lock().await;
            if let Err(e) = store.touch(&key).await {
                tracing::warn!(key = %key, error = %e, "Disk cache touch failed");
            }
        });
    }
}

async fn decode_blocking(data: Bytes) -> Result<CachedImage, CacheError> {
    tokio::task::spawn_blocking(move || CachedImage::decode(&data, 1.0))
        .await
        .map_err(|e| CacheError::DecodeError(e.to_string()))?
}

async fn encode_blocking(image: CachedImage) -> Result<Bytes, CacheError> {
    tokio::task::spawn_blocking(move || image.encode_png().map(Bytes::from))
        .await
        .map_err(|e| CacheError::EncodeError(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::disk::mock_backend::MockDiskBackend;
    use super::*;
    use image::RgbaImage;

    fn image(width: u32, height: u32) -> CachedImage {
        CachedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(width, height)), 1.0)
    }

    fn settings(policy: CachePolicy) -> CacheSettings {
        CacheSettings {
            name: "test".to_string(),
            root_dir: Some(PathBuf::from("/cache")),
            policy,
            ..CacheSettings::default()
        }
    }

    async fn open(policy: CachePolicy) -> (ImageCache, MockDiskBackend) {
        let backend = MockDiskBackend::new();
        let cache = ImageCache::with_backend(&settings(policy), Arc::new(backend.clone()))
            .await
            .unwrap();
        (cache, backend)
    }

    #[test]
    fn test_cost_uses_scale() {
        let image = CachedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(10, 20)), 2.0);
        assert_eq!(image.cost(), 800);
    }

    #[test]
    fn test_png_encode_decode() {
        let encoded = image(3, 4).encode_png().unwrap();
        let decoded = CachedImage::decode(&encoded, 1.0).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 4));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = CachedImage::decode(b"not an image", 1.0);
        assert!(matches!(result, Err(CacheError::DecodeError(_))));
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        let policy: CachePolicy = serde_yaml::from_str("memory").unwrap();
        assert_eq!(policy, CachePolicy::Memory);
        assert_eq!(CachePolicy::default(), CachePolicy::Disk);
    }

    #[tokio::test]
    async fn test_disk_policy_writes_both_tiers() {
        let (cache, backend) = open(CachePolicy::Disk).await;

        cache.cache_image(image(4, 4), None, "key").await;

        assert!(cache.has_cached_image("key").await);
        assert_eq!(backend.file_count(), 1);
        assert!(cache.used_disk_bytes().await > 0);
    }

    #[tokio::test]
    async fn test_memory_policy_skips_disk() {
        let (cache, backend) = open(CachePolicy::Memory).await;

        cache.cache_image(image(4, 4), None, "key").await;

        assert!(cache.has_cached_image("key").await);
        assert_eq!(backend.file_count(), 0);
    }

    #[tokio::test]
    async fn test_none_policy_caches_nothing() {
        let (cache, backend) = open(CachePolicy::None).await;

        cache.cache_image(image(4, 4), None, "key").await;

        assert!(!cache.has_cached_image("key").await);
        assert!(cache.get_image("key").await.is_none());
        assert_eq!(backend.file_count(), 0);
    }

    #[tokio::test]
    async fn test_raw_bytes_are_written_verbatim() {
        let (cache, backend) = open(CachePolicy::Disk).await;
        let raw = Bytes::from(image(2, 2).encode_png().unwrap());

        cache.cache_image(image(2, 2), Some(raw.clone()), "key").await;

        let path = disk::key_to_filename("key");
        assert!(backend.contains(&settings(CachePolicy::Disk).cache_dir().join(path)));
        assert_eq!(cache.used_disk_bytes().await, raw.len() as u64);
    }

    #[tokio::test]
    async fn test_disk_hit_repopulates_memory() {
        let (cache, _backend) = open(CachePolicy::Disk).await;
        cache.cache_image(image(5, 6), None, "key").await;
        cache.clear_memory();

        let found = cache.get_image("key").await.unwrap();
        assert_eq!((found.width(), found.height()), (5, 6));

        let again = cache.get_image("key").await.unwrap();
        assert_eq!(again.width(), 5);

        let stats = cache.stats().await;
        assert_eq!(stats.disk_hits, 1);
        assert_eq!(stats.memory_hits, 1);
    }

    #[tokio::test]
    async fn test_read_only_disk_entry_is_still_a_hit() {
        let (cache, backend) = open(CachePolicy::Disk).await;
        cache.cache_image(image(5, 6), None, "key").await;
        cache.clear_memory();
        backend.set_touch_fails(true);

        assert!(cache.has_cached_image("key").await);
        let found = cache.get_image("key").await.unwrap();
        assert_eq!((found.width(), found.height()), (5, 6));
        assert_eq!(cache.stats().await.disk_hits, 1);
    }

    #[tokio::test]
    async fn test_remove_clears_both_tiers() {
        let (cache, backend) = open(CachePolicy::Disk).await;
        cache.cache_image(image(4, 4), None, "key").await;

        cache.remove_image("key").await;

        assert!(!cache.has_cached_image("key").await);
        assert_eq!(backend.file_count(), 0);
        assert_eq!(cache.used_disk_bytes().await, 0);
    }

    #[tokio::test]
    async fn test_miss_is_counted() {
        let (cache, _backend) = open(CachePolicy::Disk).await;
        assert!(cache.get_image("missing").await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_disk_errors_are_treated_as_misses() {
        let (cache, backend) = open(CachePolicy::Disk).await;
        backend.set_permission_denied(true);

        cache.cache_image(image(4, 4), None, "key").await;
        cache.clear_memory();

        assert!(!cache.has_cached_image("key").await);
        assert!(cache.get_image("key").await.is_none());
    }

    #[tokio::test]
    async fn test_set_max_disk_capacity_evicts() {
        let (cache, backend) = open(CachePolicy::Disk).await;
        for key in ["a", "b", "c"] {
            cache.cache_image(image(8, 8), None, key).await;
        }
        let used = cache.used_disk_bytes().await;

        cache.set_max_disk_capacity(used / 2).await;

        assert!(cache.used_disk_bytes().await <= used / 2);
        assert!(backend.file_count() < 3);
        assert!(cache.stats().await.disk_evictions > 0);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let mut settings = settings(CachePolicy::Disk);
        settings.eviction_threshold = 1.5;
        let result = ImageCache::with_backend(&settings, Arc::new(MockDiskBackend::new())).await;
        assert!(matches!(result, Err(CacheError::ConfigurationError(_))));
    }
}
