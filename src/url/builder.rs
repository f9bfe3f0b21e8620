// Delivery URL builder

use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::encoding::{percent_decode, shard_for, smart_encode};
use super::{DeliveryType, ResourceType, UrlError};
use crate::config::CloudConfig;
use crate::constants::{CLD_COM, OLD_AKAMAI_SHARED_CDN, SHARED_CDN};
use crate::signature::delivery_signature;
use crate::transformation::Transformation;

static PRELOADED_REGEX: OnceLock<Regex> = OnceLock::new();
static VERSIONED_ID_REGEX: OnceLock<Regex> = OnceLock::new();
static ABSOLUTE_URL_REGEX: OnceLock<Regex> = OnceLock::new();
static SLASH_RUN_REGEX: OnceLock<Regex> = OnceLock::new();

/// `resource_type/type/v1234/public_id#signature`
fn preloaded_regex() -> &'static Regex {
    PRELOADED_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^([^/]+)/([^/]+)/v([0-9]+)/([^#]+)(#[0-9a-f]+)?$")
            .expect("Invalid preloaded regex - this is a compile-time bug")
    })
}

fn versioned_id_regex() -> &'static Regex {
    VERSIONED_ID_REGEX.get_or_init(|| {
        Regex::new(r"^v[0-9]+/").expect("Invalid version regex - this is a compile-time bug")
    })
}

fn absolute_url_regex() -> &'static Regex {
    ABSOLUTE_URL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^https?:/").expect("Invalid absolute url regex - this is a compile-time bug")
    })
}

fn slash_run_regex() -> &'static Regex {
    SLASH_RUN_REGEX.get_or_init(|| {
        Regex::new(r"([^:])/+").expect("Invalid slash regex - this is a compile-time bug")
    })
}

/// Builds delivery URLs for one cloud
///
/// Setters take and return the builder by value; a configured builder can be
/// reused for any number of public ids.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    config: Arc<CloudConfig>,
    resource_type: ResourceType,
    delivery_type: DeliveryType,
    format: Option<String>,
    version: Option<String>,
    suffix: Option<String>,
    use_root_path: bool,
    shorten: bool,
    transformation: Option<Transformation>,
}

impl UrlBuilder {
    pub fn new(config: Arc<CloudConfig>) -> Self {
        Self {
            config,
            resource_type: ResourceType::Image,
            delivery_type: DeliveryType::Upload,
            format: None,
            version: None,
            suffix: None,
            use_root_path: false,
            shorten: false,
            transformation: None,
        }
    }

    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn delivery_type(mut self, delivery_type: DeliveryType) -> Self {
        self.delivery_type = delivery_type;
        self
    }

    /// File extension; for `fetch` URLs this becomes an `f_` directive
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// SEO suffix, private CDN only
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Drop the `image/upload` segment
    pub fn use_root_path(mut self, use_root_path: bool) -> Self {
        self.use_root_path = use_root_path;
        self
    }

    /// Shorten `image/upload` to `iu`
    pub fn shorten(mut self, shorten: bool) -> Self {
        self.shorten = shorten;
        self
    }

    pub fn transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Generate the delivery URL for `public_id`
    ///
    /// Every failure is logged before it is returned.
    pub fn generate(&self, public_id: &str, sign: bool) -> Result<String, UrlError> {
        self.build(public_id, sign).map_err(|e| {
            tracing::error!(
                error = %e,
                public_id = %public_id,
                cloud_name = %self.config.cloud_name,
                "Failed to generate delivery URL"
            );
            e
        })
    }

    fn suffix_value(&self) -> Option<&str> {
        self.suffix.as_deref().filter(|s| !s.is_empty())
    }

    fn build(&self, public_id: &str, sign: bool) -> Result<String, UrlError> {
        let api_secret = match (sign, self.config.api_secret.as_deref()) {
            (true, None) => return Err(UrlError::MissingApiSecret),
            (true, Some(secret)) => Some(secret),
            (false, _) => None,
        };
        if public_id.is_empty() {
            return Err(UrlError::EmptyPublicId);
        }

        let mut source_name = public_id.to_string();
        let mut resource_type = self.resource_type.as_str().to_string();
        let mut delivery_type = self.delivery_type.as_str().to_string();
        let mut version = self.version.clone().unwrap_or_default();
        let mut format = self.format.clone().filter(|f| !f.is_empty());

        if let Some(caps) = preloaded_regex().captures(public_id) {
            resource_type = caps[1].to_string();
            delivery_type = caps[2].to_string();
            version = caps[3].to_string();
            source_name = caps[4].to_string();
        }

        let mut transformation = self.transformation.clone().unwrap_or_default();
        if delivery_type == DeliveryType::Fetch.as_str() {
            if let Some(fetch_format) = format.take() {
                transformation = transformation.fetch_format(fetch_format);
            }
        }
        let transformation = transformation.to_url_string()?;

        let is_absolute = absolute_url_regex().is_match(&source_name);
        if version.is_empty()
            && source_name.contains('/')
            && !versioned_id_regex().is_match(&source_name)
            && !is_absolute
        {
            version = "1".to_string();
        }
        if !version.is_empty() {
            version = format!("v{}", version);
        }

        let mut to_sign = String::new();
        if !transformation.is_empty() {
            to_sign.push_str(&transformation);
            to_sign.push('/');
        }

        if is_absolute {
            source_name = smart_encode(&source_name);
            to_sign.push_str(&source_name);
        } else {
            let decoded = percent_decode(&source_name).unwrap_or_else(|| source_name.clone());
            source_name = smart_encode(&decoded);
            to_sign.push_str(&source_name);

            if let Some(suffix) = self.suffix_value() {
                if suffix.contains('/') || suffix.contains('.') {
                    return Err(UrlError::InvalidSuffix);
                }
                source_name = format!("{}/{}", source_name, suffix);
            }

            if let Some(format) = format.as_deref() {
                source_name = format!("{}.{}", source_name, format);
                to_sign.push('.');
                to_sign.push_str(format);
            }
        }

        let prefix = self.prefix(&source_name);
        let resource_and_type = self.resource_and_type(&resource_type, &delivery_type)?;

        let signature = match api_secret {
            Some(secret) => delivery_signature(&to_sign, secret),
            None => String::new(),
        };

        let url = [
            prefix.as_str(),
            resource_and_type.as_str(),
            signature.as_str(),
            transformation.as_str(),
            version.as_str(),
            source_name.as_str(),
        ]
        .join("/");

        Ok(slash_run_regex().replace_all(&url, "$1/").into_owned())
    }

    /// Scheme, host and (for the shared CDN) cloud name
    fn prefix(&self, source_name: &str) -> String {
        let config = &self.config;
        let mut prefix = if config.secure {
            let mut distribution = match config.secure_distribution.as_deref() {
                Some(dist) if !dist.is_empty() && dist != OLD_AKAMAI_SHARED_CDN => dist.to_string(),
                _ if config.private_cdn => format!("{}-{}", config.cloud_name, SHARED_CDN),
                _ => SHARED_CDN.to_string(),
            };
            if config.secure_cdn_subdomain {
                let sharded = format!("res-{}{}", shard_for(source_name), CLD_COM);
                distribution = distribution.replace(SHARED_CDN, &sharded);
            }
            format!("https://{}", distribution)
        } else if let Some(cname) = config.cname.as_deref().filter(|c| !c.is_empty()) {
            let shard = if config.cdn_subdomain {
                format!("a{}.", shard_for(source_name))
            } else {
                String::new()
            };
            format!("http://{}{}", shard, cname)
        } else {
            let private = if config.private_cdn {
                format!("{}-", config.cloud_name)
            } else {
                String::new()
            };
            let shard = if config.cdn_subdomain {
                format!("-{}", shard_for(source_name))
            } else {
                String::new()
            };
            format!("http://{}res{}{}", private, shard, CLD_COM)
        };

        if !config.private_cdn {
            prefix.push('/');
            prefix.push_str(&config.cloud_name);
        }
        prefix
    }

    /// `{resource_type}/{type}` or its collapsed form
    fn resource_and_type(&self, resource_type: &str, delivery_type: &str) -> Result<String, UrlError> {
        let suffix = self.suffix_value();
        if suffix.is_some() && !self.config.private_cdn {
            return Err(UrlError::SuffixRequiresPrivateCdn);
        }

        let mut segment = format!("{}/{}", resource_type, delivery_type);
        if suffix.is_some() {
            segment = match segment.as_str() {
                "image/upload" => "images".to_string(),
                "raw/upload" => "files".to_string(),
                _ => return Err(UrlError::SuffixNotSupported(segment)),
            };
        }

        if self.use_root_path {
            if segment == "image/upload" || segment == "images" {
                segment = String::new();
            } else {
                return Err(UrlError::RootPathNotSupported(segment));
            }
        }

        if self.shorten && segment == "image/upload" {
            segment = "iu".to_string();
        }

        Ok(segment)
    }
}
