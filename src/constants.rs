// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Delivery hosts must match the server-side grammar exactly.

// =============================================================================
// Delivery hosts
// =============================================================================

/// Shared delivery domain suffix
pub const CLD_COM: &str = ".cloudinary.com";

/// Shared delivery CDN host
pub const SHARED_CDN: &str = "res.cloudinary.com";

/// Legacy Akamai shared host; treated as "no secure distribution configured"
pub const OLD_AKAMAI_SHARED_CDN: &str = "cloudinary-a.akamaihd.net";

/// Number of CDN subdomain shards used by `cdn_subdomain` / `secure_cdn_subdomain`
pub const CDN_SHARD_COUNT: u32 = 5;

/// Default upload/admin API host
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// API version path segment
pub const API_VERSION: &str = "v1_1";

/// Environment variable holding a `cloudinary://` configuration URL
pub const CLOUDINARY_URL_ENV: &str = "CLOUDINARY_URL";

// =============================================================================
// Image cache defaults
// =============================================================================

/// Name of the default cache instance
pub const DEFAULT_CACHE_NAME: &str = "defaultImageCache";

/// Prefix of every cache directory name
pub const CACHE_BASE_NAME: &str = "com.cloudinary.sdk.imageCache";

/// Default memory tier cost limit (30 MB worth of pixels)
pub const DEFAULT_MAX_MEMORY_COST_MB: u64 = 30;

/// Default disk tier capacity (150 MB)
pub const DEFAULT_MAX_DISK_CAPACITY_MB: u64 = 150;

/// Fraction of the disk capacity that eviction shrinks usage down to
pub const DEFAULT_EVICTION_THRESHOLD: f64 = 0.8;

// =============================================================================
// Network defaults
// =============================================================================

/// Default maximum number of concurrent downloads
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 6;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// User agent product token
pub const USER_AGENT_PRODUCT: &str = "CloudinaryRust";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_cdn_is_built_from_domain_suffix() {
        assert_eq!(SHARED_CDN, format!("res{}", CLD_COM));
    }

    #[test]
    fn test_eviction_threshold_is_a_fraction() {
        assert!(DEFAULT_EVICTION_THRESHOLD > 0.0 && DEFAULT_EVICTION_THRESHOLD < 1.0);
    }
}
