//! Memory tier backed by moka
//!
//! Entries are weighted by their pixel cost (`width × scale × height × scale`)
//! and evicted once the total cost exceeds the configured limit.

use moka::notification::RemovalCause;
use parking_lot::RwLock;
use std::sync::Arc;

use super::stats::CacheStatsTracker;
use super::CachedImage;

type MokaCache = moka::sync::Cache<String, CachedImage>;

pub(crate) struct MemoryTier {
    cache: RwLock<MokaCache>,
    max_cost: RwLock<u64>,
    stats: Arc<CacheStatsTracker>,
}

impl MemoryTier {
    pub fn new(max_cost: u64, stats: Arc<CacheStatsTracker>) -> Self {
        Self {
            cache: RwLock::new(Self::build(max_cost, stats.clone())),
            max_cost: RwLock::new(max_cost),
            stats,
        }
    }

    fn build(max_cost: u64, stats: Arc<CacheStatsTracker>) -> MokaCache {
        moka::sync::Cache::builder()
            .max_capacity(max_cost)
            .weigher(|_key, image: &CachedImage| {
                let cost = image.cost();
                if cost > u32::MAX as u64 {
                    u32::MAX
                } else {
                    cost as u32
                }
            })
            .eviction_listener(move |_key, _value, cause| {
                // Explicit removals and replacements are not evictions
                if cause == RemovalCause::Size {
                    stats.increment_memory_evictions();
                }
            })
            .build()
    }

    pub fn get(&self, key: &str) -> Option<CachedImage> {
        self.cache.read().get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.read().contains_key(key)
    }

    pub fn insert(&self, key: &str, image: CachedImage) {
        self.cache.read().insert(key.to_string(), image);
    }

    pub fn remove(&self, key: &str) {
        self.cache.read().invalidate(key);
    }

    pub fn clear(&self) {
        self.cache.read().invalidate_all();
    }

    pub fn max_cost(&self) -> u64 {
        *self.max_cost.read()
    }

    /// Replace the tier with one using the new limit. Current entries are
    /// dropped.
    pub fn set_max_cost(&self, max_cost: u64) {
        let mut cache = self.cache.write();
        cache.invalidate_all();
        *cache = Self::build(max_cost, self.stats.clone());
        *self.max_cost.write() = max_cost;
    }

    /// Process pending evictions so sizes and counts are exact
    pub fn run_pending_tasks(&self) {
        self.cache.read().run_pending_tasks();
    }

    pub fn weighted_size(&self) -> u64 {
        self.cache.read().weighted_size()
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.read().entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn image(width: u32, height: u32) -> CachedImage {
        CachedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(width, height)), 1.0)
    }

    fn tier(max_cost: u64) -> MemoryTier {
        MemoryTier::new(max_cost, Arc::new(CacheStatsTracker::new()))
    }

    #[test]
    fn test_insert_then_get() {
        let memory = tier(1_000_000);
        memory.insert("a", image(10, 10));
        assert!(memory.contains("a"));
        assert_eq!(memory.get("a").unwrap().width(), 10);
    }

    #[test]
    fn test_remove_and_clear() {
        let memory = tier(1_000_000);
        memory.insert("a", image(2, 2));
        memory.insert("b", image(2, 2));
        memory.remove("a");
        assert!(!memory.contains("a"));
        memory.clear();
        assert!(!memory.contains("b"));
    }

    #[test]
    fn test_weighted_size_tracks_cost() {
        let memory = tier(1_000_000);
        memory.insert("a", image(10, 20));
        memory.run_pending_tasks();
        assert_eq!(memory.weighted_size(), 200);
        assert_eq!(memory.entry_count(), 1);
    }

    #[test]
    fn test_cost_limit_is_enforced() {
        let memory = tier(250);
        for i in 0..10 {
            memory.insert(&format!("k{}", i), image(10, 10));
        }
        memory.run_pending_tasks();
        assert!(memory.weighted_size() <= 250);
    }

    #[test]
    fn test_set_max_cost_rebuilds_tier() {
        let memory = tier(1_000);
        memory.insert("a", image(5, 5));
        memory.set_max_cost(50);
        assert_eq!(memory.max_cost(), 50);
        assert!(!memory.contains("a"));
    }
}
