// Error types module

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::network::NetworkError;
use crate::transformation::TransformationError;
use crate::url::UrlError;

/// Centralized error type for the SDK
///
/// Each subsystem keeps its own error enum; this type aggregates them for
/// callers that drive several subsystems at once.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration errors (invalid YAML, missing env vars, bad cloudinary URL)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transformation could not be serialized
    #[error("Transformation error: {0}")]
    Transformation(#[from] TransformationError),

    /// Delivery URL could not be generated
    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    /// Image cache failures
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Transport and API errors, passed through unchanged
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}
