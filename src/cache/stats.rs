//! Cache statistics types

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of image cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from either tier
    pub hits: u64,
    /// Lookups answered by neither tier
    pub misses: u64,
    /// Lookups answered from the memory tier
    pub memory_hits: u64,
    /// Lookups answered from the disk tier
    pub disk_hits: u64,
    /// Entries dropped by the memory tier to stay under its cost limit
    pub memory_evictions: u64,
    /// Files deleted by disk eviction
    pub disk_evictions: u64,
    /// Total cost of the entries held in memory
    pub memory_cost: u64,
    pub memory_entry_count: u64,
    pub max_memory_cost: u64,
    pub used_disk_bytes: u64,
    pub max_disk_capacity: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total requests)
    /// Returns 0.0 if there are no requests
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Statistics tracker using atomics for thread safety
#[derive(Debug, Default)]
pub(crate) struct CacheStatsTracker {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    memory_evictions: AtomicU64,
    disk_evictions: AtomicU64,
}

impl CacheStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_memory_hits(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_disk_hits(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_misses(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_memory_evictions(&self) {
        self.memory_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_disk_evictions(&self, count: u64) {
        self.disk_evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Counter part of a snapshot; sizes are filled in by the cache
    pub fn snapshot(&self) -> CacheStats {
        let memory_hits = self.memory_hits.load(Ordering::Relaxed);
        let disk_hits = self.disk_hits.load(Ordering::Relaxed);
        CacheStats {
            hits: memory_hits + disk_hits,
            misses: self.misses.load(Ordering::Relaxed),
            memory_hits,
            disk_hits,
            memory_evictions: self.memory_evictions.load(Ordering::Relaxed),
            disk_evictions: self.disk_evictions.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}
