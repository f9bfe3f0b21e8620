// Top-level client

use std::sync::Arc;

use crate::cache::{CachePolicy, ImageCache};
use crate::config::{CloudConfig, NetworkSettings, SdkConfig};
use crate::downloader::Downloader;
use crate::error::SdkError;
use crate::management::ManagementApi;
use crate::network::{NetworkAdapter, ReqwestAdapter};
use crate::uploader::Uploader;
use crate::url::UrlBuilder;

/// Entry point of the SDK: owns the cloud configuration, the transport and
/// an optional image cache, and hands out URL builders and API objects that
/// share them.
#[derive(Clone)]
pub struct Cloudinary {
    config: Arc<CloudConfig>,
    network: Arc<dyn NetworkAdapter>,
    downloader: Arc<Downloader>,
}

impl std::fmt::Debug for Cloudinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloudinary")
            .field("cloud_name", &self.config.cloud_name)
            .field("has_cache", &self.downloader.cache().is_some())
            .finish()
    }
}

impl Cloudinary {
    /// Client with the default transport and no image cache
    pub fn new(config: CloudConfig) -> Result<Self, SdkError> {
        let settings = NetworkSettings::default();
        let network = Arc::new(ReqwestAdapter::new(&settings)?);
        Self::with_network(config, network, None, &settings)
    }

    /// Client with a custom transport and an optional image cache
    pub fn with_network(
        config: CloudConfig,
        network: Arc<dyn NetworkAdapter>,
        cache: Option<Arc<ImageCache>>,
        settings: &NetworkSettings,
    ) -> Result<Self, SdkError> {
        config.validate()?;
        settings.validate()?;

        let downloader = Arc::new(Downloader::new(
            network.clone(),
            cache,
            settings.max_concurrent_downloads,
        ));
        tracing::info!(
            cloud_name = %config.cloud_name,
            max_concurrent_downloads = settings.max_concurrent_downloads,
            "Cloudinary client created"
        );

        Ok(Self {
            config: Arc::new(config),
            network,
            downloader,
        })
    }

    /// Client from a full configuration; opens the configured image cache
    /// unless its policy is `None`
    pub async fn from_config(config: &SdkConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let network = Arc::new(ReqwestAdapter::new(&config.network)?);
        let cache = match config.cache.policy {
            CachePolicy::None => None,
            _ => Some(Arc::new(ImageCache::open(&config.cache).await?)),
        };
        Self::with_network(config.cloud.clone(), network, cache, &config.network)
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// A new URL builder for this cloud
    pub fn create_url(&self) -> UrlBuilder {
        UrlBuilder::new(self.config.clone())
    }

    /// Delivery URL of an image with default options. Failures are logged
    /// by the builder and yield `None`.
    pub fn build_url(&self, public_id: &str, sign: bool) -> Option<String> {
        self.create_url().generate(public_id, sign).ok()
    }

    pub fn uploader(&self) -> Uploader {
        Uploader::new(self.config.clone(), self.network.clone())
    }

    pub fn downloader(&self) -> Arc<Downloader> {
        self.downloader.clone()
    }

    pub fn management(&self) -> ManagementApi {
        ManagementApi::new(self.config.clone(), self.network.clone())
    }

    pub fn cache(&self) -> Option<&Arc<ImageCache>> {
        self.downloader.cache()
    }

    pub fn set_max_concurrent_downloads(&self, max: usize) {
        self.downloader.set_max_concurrent_downloads(max);
    }

    /// Policy of the image cache; `None` when the client has no cache
    pub fn cache_policy(&self) -> CachePolicy {
        self.cache()
            .map_or(CachePolicy::None, |cache| cache.cache_policy())
    }

    pub fn set_cache_policy(&self, policy: CachePolicy) {
        if let Some(cache) = self.cache() {
            cache.set_cache_policy(policy);
        }
    }

    pub async fn set_cache_max_disk_capacity(&self, capacity: u64) {
        if let Some(cache) = self.cache() {
            cache.set_max_disk_capacity(capacity).await;
        }
    }
}
