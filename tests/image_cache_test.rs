// Image cache integration tests
//
// Runs the two-tier cache against the real filesystem in a temporary
// directory. Sleeps between writes keep file modification times distinct so
// recency ordering is observable.

use bytes::Bytes;
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use cloudinary_sdk::cache::disk::key_to_filename;
use cloudinary_sdk::cache::{CachePolicy, CachedImage, ImageCache};
use cloudinary_sdk::config::CacheSettings;

const MTIME_GAP: Duration = Duration::from_millis(20);

fn image() -> CachedImage {
    CachedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)), 1.0)
}

fn png() -> Bytes {
    Bytes::from(image().encode_png().unwrap())
}

fn settings(dir: &TempDir, policy: CachePolicy) -> CacheSettings {
    CacheSettings {
        name: "test".to_string(),
        root_dir: Some(dir.path().to_path_buf()),
        policy,
        ..CacheSettings::default()
    }
}

async fn file_path(cache: &ImageCache, key: &str) -> PathBuf {
    cache.dir().await.join(key_to_filename(key))
}

#[tokio::test]
async fn test_cache_directory_layout() {
    let dir = TempDir::new().unwrap();
    let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();

    cache.cache_image(image(), Some(png()), "http://example.com/a.png").await;

    let expected_dir = dir.path().join("com.cloudinary.sdk.imageCache.test");
    assert_eq!(cache.dir().await, expected_dir);
    assert!(expected_dir.join(key_to_filename("http://example.com/a.png")).exists());
}

#[tokio::test]
async fn test_has_cached_image_follows_cache_and_remove() {
    for policy in [CachePolicy::Disk, CachePolicy::Memory] {
        let dir = TempDir::new().unwrap();
        let cache = ImageCache::open(&settings(&dir, policy)).await.unwrap();

        assert!(!cache.has_cached_image("key").await);
        cache.cache_image(image(), None, "key").await;
        assert!(cache.has_cached_image("key").await, "cached with {:?}", policy);
        cache.remove_image("key").await;
        assert!(!cache.has_cached_image("key").await, "removed with {:?}", policy);
    }
}

#[tokio::test]
async fn test_disk_entries_survive_reopen() {
    // Test: a new cache over the same directory sees earlier entries and
    // accounts for their size
    let dir = TempDir::new().unwrap();
    let used = {
        let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
        cache.cache_image(image(), Some(png()), "a").await;
        cache.cache_image(image(), Some(png()), "b").await;
        cache.used_disk_bytes().await
    };
    assert_eq!(used, 2 * png().len() as u64);

    let reopened = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
    assert_eq!(reopened.used_disk_bytes().await, used);

    let found = reopened.get_image("a").await.unwrap();
    assert_eq!((found.width(), found.height()), (4, 4));
    assert_eq!(reopened.stats().await.disk_hits, 1);
}

#[tokio::test]
async fn test_overflow_evicts_least_recently_modified() {
    let dir = TempDir::new().unwrap();
    let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
    let size = png().len() as u64;
    cache.set_max_disk_capacity(3 * size).await;

    for key in ["a", "b", "c"] {
        cache.cache_image(image(), Some(png()), key).await;
        tokio::time::sleep(MTIME_GAP).await;
    }

    // Reaching capacity shrinks usage to at most 80% of it: one file goes
    assert!(cache.used_disk_bytes().await <= cache.max_disk_capacity().await);
    assert!(!file_path(&cache, "a").await.exists());
    assert!(file_path(&cache, "b").await.exists());
    assert!(file_path(&cache, "c").await.exists());
    assert_eq!(cache.used_disk_bytes().await, 2 * size);
}

#[tokio::test]
async fn test_disk_read_refreshes_recency() {
    let dir = TempDir::new().unwrap();
    let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
    let size = png().len() as u64;
    cache.set_max_disk_capacity(4 * size).await;

    for key in ["a", "b", "c"] {
        cache.cache_image(image(), Some(png()), key).await;
        tokio::time::sleep(MTIME_GAP).await;
    }

    cache.clear_memory();
    assert!(cache.get_image("a").await.is_some());
    tokio::time::sleep(MTIME_GAP).await;

    cache.cache_image(image(), Some(png()), "d").await;

    assert!(file_path(&cache, "a").await.exists());
    assert!(!file_path(&cache, "b").await.exists());
    assert!(file_path(&cache, "d").await.exists());
}

#[tokio::test]
async fn test_shrinking_capacity_evicts_immediately() {
    let dir = TempDir::new().unwrap();
    let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
    let size = png().len() as u64;

    for key in ["a", "b", "c", "d"] {
        cache.cache_image(image(), Some(png()), key).await;
        tokio::time::sleep(MTIME_GAP).await;
    }
    assert_eq!(cache.used_disk_bytes().await, 4 * size);

    cache.set_max_disk_capacity(2 * size).await;

    assert!(cache.used_disk_bytes().await <= 2 * size);
    assert!(!file_path(&cache, "a").await.exists());
    assert!(file_path(&cache, "d").await.exists());
}

#[tokio::test]
async fn test_low_memory_signal_keeps_disk() {
    let dir = TempDir::new().unwrap();
    let cache = ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap();
    cache.cache_image(image(), None, "key").await;

    cache.clear_memory();

    assert!(cache.has_cached_image("key").await);
    let stats = cache.stats().await;
    assert_eq!(stats.memory_entry_count, 0);
    assert!(stats.used_disk_bytes > 0);
}

#[tokio::test]
async fn test_concurrent_writers_keep_usage_consistent() {
    let dir = TempDir::new().unwrap();
    let cache = std::sync::Arc::new(
        ImageCache::open(&settings(&dir, CachePolicy::Disk)).await.unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.cache_image(image(), Some(png()), &format!("key-{}", i % 8)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let on_disk: u64 = std::fs::read_dir(cache.dir().await)
        .unwrap()
        .map(|entry| entry.unwrap().metadata().unwrap().len())
        .sum();
    assert_eq!(cache.used_disk_bytes().await, on_disk);
    assert_eq!(on_disk, 8 * png().len() as u64);
}
