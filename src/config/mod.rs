// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod cloud;

pub use cloud::CloudConfig;

use crate::cache::CachePolicy;
use crate::constants::{
    CACHE_BASE_NAME, DEFAULT_CACHE_NAME, DEFAULT_EVICTION_THRESHOLD,
    DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_MAX_DISK_CAPACITY_MB, DEFAULT_MAX_MEMORY_COST_MB,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid cloudinary URL '{0}'")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub cloud: CloudConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

fn default_max_memory_cost_mb() -> u64 {
    DEFAULT_MAX_MEMORY_COST_MB
}

fn default_max_disk_capacity_mb() -> u64 {
    DEFAULT_MAX_DISK_CAPACITY_MB
}

fn default_eviction_threshold() -> f64 {
    DEFAULT_EVICTION_THRESHOLD
}

/// Image cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    /// Name of the cache instance; selects its directory under the cache root
    #[serde(default = "default_cache_name")]
    pub name: String,
    /// Cache root directory. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    #[serde(default)]
    pub policy: CachePolicy,
    #[serde(default = "default_max_memory_cost_mb")]
    pub max_memory_cost_mb: u64,
    #[serde(default = "default_max_disk_capacity_mb")]
    pub max_disk_capacity_mb: u64,
    /// Eviction shrinks disk usage to `max_disk_capacity * eviction_threshold`
    #[serde(default = "default_eviction_threshold")]
    pub eviction_threshold: f64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            name: default_cache_name(),
            root_dir: None,
            policy: CachePolicy::default(),
            max_memory_cost_mb: DEFAULT_MAX_MEMORY_COST_MB,
            max_disk_capacity_mb: DEFAULT_MAX_DISK_CAPACITY_MB,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
        }
    }
}

impl CacheSettings {
    /// `{root}/com.cloudinary.sdk.imageCache.{name}`
    pub fn cache_dir(&self) -> PathBuf {
        let root = self
            .root_dir
            .clone()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir);
        root.join(format!("{}.{}", CACHE_BASE_NAME, self.name))
    }

    pub fn max_memory_cost(&self) -> u64 {
        self.max_memory_cost_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_disk_capacity(&self) -> u64 {
        self.max_disk_capacity_mb.saturating_mul(1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("cache name cannot be empty".to_string()));
        }
        if self.name.contains('/') || self.name.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "cache name '{}' must not contain path separators",
                self.name
            )));
        }
        if !(self.eviction_threshold > 0.0 && self.eviction_threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "eviction_threshold must be between 0 and 1 (exclusive), got {}",
                self.eviction_threshold
            )));
        }
        Ok(())
    }
}

fn default_max_concurrent_downloads() -> usize {
    DEFAULT_MAX_CONCURRENT_DOWNLOADS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Transfer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkSettings {
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Optional `Platform/version` token prepended to the user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_platform: Option<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_platform: None,
        }
    }
}

impl NetworkSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl SdkConfig {
    /// Configuration with default cache/network/logging settings
    pub fn new(cloud: CloudConfig) -> Self {
        Self {
            cloud,
            cache: CacheSettings::default(),
            network: NetworkSettings::default(),
            logging: LoggingSettings::default(),
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Cloud settings from `CLOUDINARY_URL`, everything else defaulted
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(CloudConfig::from_env()?))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cloud.validate()?;
        self.cache.validate()?;
        self.network.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging level cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_can_be_loaded_from_file_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_yaml = r#"
cloud:
  cloud_name: "demo"
  api_key: "123"
  api_secret: "abc"
  secure: true
cache:
  name: "thumbs"
  max_disk_capacity_mb: 10
"#;
        temp_file.write_all(config_yaml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SdkConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.cloud.cloud_name, "demo");
        assert!(config.cloud.secure);
        assert_eq!(config.cache.name, "thumbs");
        assert_eq!(config.cache.max_disk_capacity(), 10 * 1024 * 1024);
        assert_eq!(config.cache.eviction_threshold, DEFAULT_EVICTION_THRESHOLD);
        assert_eq!(config.network.max_concurrent_downloads, DEFAULT_MAX_CONCURRENT_DOWNLOADS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_can_substitute_env_var_in_secret() {
        std::env::set_var("CLD_TEST_SECRET_SUBST", "s3cr3t");
        let yaml = r#"
cloud:
  cloud_name: "demo"
  api_secret: "${CLD_TEST_SECRET_SUBST}"
"#;
        let config = SdkConfig::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.cloud.api_secret.as_deref(), Some("s3cr3t"));
        std::env::remove_var("CLD_TEST_SECRET_SUBST");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = r#"
cloud:
  cloud_name: "${CLD_TEST_DEFINITELY_NOT_SET}"
"#;
        let err = SdkConfig::from_yaml_with_env(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "CLD_TEST_DEFINITELY_NOT_SET"));
    }

    #[test]
    fn test_threshold_outside_unit_interval_is_rejected() {
        let mut config = SdkConfig::new(CloudConfig::new("demo"));
        config.cache.eviction_threshold = 1.0;
        assert!(config.validate().is_err());
        config.cache.eviction_threshold = 0.0;
        assert!(config.validate().is_err());
        config.cache.eviction_threshold = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = SdkConfig::new(CloudConfig::new("demo"));
        config.network.max_concurrent_downloads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_cache_name_is_rejected() {
        let mut config = SdkConfig::new(CloudConfig::new("demo"));
        config.cache.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_dir_layout() {
        let settings = CacheSettings {
            root_dir: Some(PathBuf::from("/tmp/cld")),
            ..CacheSettings::default()
        };
        assert_eq!(
            settings.cache_dir(),
            PathBuf::from("/tmp/cld/com.cloudinary.sdk.imageCache.defaultImageCache")
        );
    }

    #[test]
    fn test_logging_format_parses_lowercase() {
        let yaml = r#"
cloud:
  cloud_name: "demo"
logging:
  level: "debug"
  format: json
"#;
        let config = SdkConfig::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_huge_cache_sizes_saturate() {
        let settings = CacheSettings {
            max_memory_cost_mb: u64::MAX,
            max_disk_capacity_mb: u64::MAX / 2,
            ..CacheSettings::default()
        };
        assert_eq!(settings.max_memory_cost(), u64::MAX);
        assert_eq!(settings.max_disk_capacity(), u64::MAX);

        let settings = CacheSettings {
            max_disk_capacity_mb: 3,
            ..CacheSettings::default()
        };
        assert_eq!(settings.max_disk_capacity(), 3 * 1024 * 1024);
    }
}
