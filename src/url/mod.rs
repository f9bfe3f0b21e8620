//! Delivery URL generation
//!
//! ```text
//! http://res.cloudinary.com/{cloud}/{resource_type}/{type}/[s--sig--/][transformation/][v{version}/]{public_id}[.format]
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

mod builder;
pub mod encoding;

pub use builder::UrlBuilder;

use crate::transformation::TransformationError;

/// Why a delivery URL could not be generated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UrlError {
    #[error("Must supply api_secret for signing urls")]
    MissingApiSecret,

    #[error("An invalid transformation was added: {0}")]
    InvalidTransformation(#[from] TransformationError),

    #[error("URL suffix should not include . or /")]
    InvalidSuffix,

    #[error("URL suffix only supported in private CDN")]
    SuffixRequiresPrivateCdn,

    #[error("URL suffix only supported for image/upload and raw/upload, got {0}")]
    SuffixNotSupported(String),

    #[error("Root path only supported for image/upload, got {0}")]
    RootPathNotSupported(String),

    #[error("Public id cannot be empty")]
    EmptyPublicId,
}

/// Asset resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ResourceType {
    #[default]
    Image,
    Raw,
    Video,
    Auto,
    /// Any other server-side resource type
    Custom(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Raw => "raw",
            ResourceType::Video => "video",
            ResourceType::Auto => "auto",
            ResourceType::Custom(value) => value.as_str(),
        }
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "image" => ResourceType::Image,
            "raw" => ResourceType::Raw,
            "video" => ResourceType::Video,
            "auto" => ResourceType::Auto,
            other => ResourceType::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery (storage) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DeliveryType {
    #[default]
    Upload,
    /// Remote URL fetched and cached by the CDN
    Fetch,
    Facebook,
    Twitter,
    TwitterName,
    Sprite,
    Private,
    Authenticated,
    Custom(String),
}

impl DeliveryType {
    pub fn as_str(&self) -> &str {
        match self {
            DeliveryType::Upload => "upload",
            DeliveryType::Fetch => "fetch",
            DeliveryType::Facebook => "facebook",
            DeliveryType::Twitter => "twitter",
            DeliveryType::TwitterName => "twitter_name",
            DeliveryType::Sprite => "sprite",
            DeliveryType::Private => "private",
            DeliveryType::Authenticated => "authenticated",
            DeliveryType::Custom(value) => value.as_str(),
        }
    }
}

impl FromStr for DeliveryType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "upload" => DeliveryType::Upload,
            "fetch" => DeliveryType::Fetch,
            "facebook" => DeliveryType::Facebook,
            "twitter" => DeliveryType::Twitter,
            "twitter_name" => DeliveryType::TwitterName,
            "sprite" => DeliveryType::Sprite,
            "private" => DeliveryType::Private,
            "authenticated" => DeliveryType::Authenticated,
            other => DeliveryType::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
