//! Cache-first image fetching
//!
//! `fetch_image` answers from the image cache when it can and otherwise
//! downloads the URL, decodes it and writes the raw bytes back to the cache.
//! Downloads share a semaphore so at most `max_concurrent_downloads` run at
//! once; cache hits never wait for a permit.

use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::cache::{CachedImage, ImageCache};
use crate::network::{NetworkAdapter, NetworkError, ProgressHandler, Transfer, TransferContext};

struct DownloadLimit {
    max: usize,
    semaphore: Arc<Semaphore>,
}

impl DownloadLimit {
    fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            max,
            semaphore: Arc::new(Semaphore::new(max)),
        }
    }
}

pub struct Downloader {
    network: Arc<dyn NetworkAdapter>,
    cache: Option<Arc<ImageCache>>,
    limit: RwLock<DownloadLimit>,
}

impl Downloader {
    pub fn new(
        network: Arc<dyn NetworkAdapter>,
        cache: Option<Arc<ImageCache>>,
        max_concurrent_downloads: usize,
    ) -> Self {
        Self {
            network,
            cache,
            limit: RwLock::new(DownloadLimit::new(max_concurrent_downloads)),
        }
    }

    pub fn cache(&self) -> Option<&Arc<ImageCache>> {
        self.cache.as_ref()
    }

    pub fn max_concurrent_downloads(&self) -> usize {
        self.limit.read().max
    }

    /// Change the download limit. Downloads already holding a permit finish
    /// under the old limit; new downloads use the new one.
    pub fn set_max_concurrent_downloads(&self, max: usize) {
        *self.limit.write() = DownloadLimit::new(max);
        tracing::debug!(max = max.max(1), "Download limit changed");
    }

    fn semaphore(&self) -> Arc<Semaphore> {
        self.limit.read().semaphore.clone()
    }

    /// Fetch an image, from the cache if present
    pub fn fetch_image(&self, url: &str, progress: Option<ProgressHandler>) -> Transfer<CachedImage> {
        let url = url.to_string();
        let network = self.network.clone();
        let cache = self.cache.clone();
        let semaphore = self.semaphore();

        Transfer::spawn(progress, move |ctx| async move {
            if let Some(cache) = &cache {
                if let Some(image) = cache.get_image(&url).await {
                    tracing::debug!(url = %url, "Image served from cache");
                    return Ok(image);
                }
            }

            let data = limited_download(network.as_ref(), &semaphore, &url, &ctx).await?;
            let image = decode(data.clone()).await?;

            if let Some(cache) = &cache {
                cache.cache_image(image.clone(), Some(data), &url).await;
            }
            Ok(image)
        })
    }

    /// Download raw bytes, bypassing the cache
    pub fn download(&self, url: &str, progress: Option<ProgressHandler>) -> Transfer<Bytes> {
        let url = url.to_string();
        let network = self.network.clone();
        let semaphore = self.semaphore();

        Transfer::spawn(progress, move |ctx| async move {
            limited_download(network.as_ref(), &semaphore, &url, &ctx).await
        })
    }
}

async fn limited_download(
    network: &dyn NetworkAdapter,
    semaphore: &Semaphore,
    url: &str,
    ctx: &TransferContext,
) -> Result<Bytes, NetworkError> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| NetworkError::Cancelled)?;
    tracing::debug!(url = %url, "Downloading");
    network.download(url, ctx).await
}

async fn decode(data: Bytes) -> Result<CachedImage, NetworkError> {
    tokio::task::spawn_blocking(move || CachedImage::decode(&data, 1.0))
        .await
        .map_err(|e| NetworkError::ImageDecode(e.to_string()))?
        .map_err(|e| NetworkError::ImageDecode(e.to_string()))
}
