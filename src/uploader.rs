//! Upload API
//!
//! Signed uploads carry `timestamp`, `api_key` and a `signature` over the
//! sorted parameters; unsigned uploads are authorized by an upload preset
//! instead.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::CloudConfig;
use crate::constants::API_VERSION;
use crate::network::{
    NetworkAdapter, NetworkError, ProgressHandler, RequestParam, RequestParams, Transfer,
    UploadPayload,
};
use crate::results::{self, UploadResult};
use crate::signature::{api_sign_request, SignatureAlgorithm};
use crate::transformation::Transformation;
use crate::url::{DeliveryType, ResourceType};

/// A signature computed elsewhere (typically by a backend holding the API
/// secret) for the exact parameters of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signature: String,
    pub timestamp: i64,
}

impl Signature {
    pub fn new(signature: impl Into<String>, timestamp: i64) -> Self {
        Self {
            signature: signature.into(),
            timestamp,
        }
    }
}

/// A rectangle on an asset, sent as `x,y,width,height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn to_param(self) -> String {
        format!(
            "{:.0},{:.0},{:.0},{:.0}",
            self.x, self.y, self.width, self.height
        )
    }
}

fn regions_param(regions: &[Region]) -> String {
    regions
        .iter()
        .map(|r| r.to_param())
        .collect::<Vec<_>>()
        .join("|")
}

/// Options of an upload request
#[derive(Debug, Clone, Default)]
pub struct UploadParams {
    pub public_id: Option<String>,
    pub folder: Option<String>,
    pub tags: Vec<String>,
    pub upload_preset: Option<String>,
    pub resource_type: ResourceType,
    pub delivery_type: Option<DeliveryType>,
    /// Incoming transformation applied before storing
    pub transformation: Option<Transformation>,
    pub format: Option<String>,
    pub overwrite: Option<bool>,
    pub invalidate: Option<bool>,
    pub use_filename: Option<bool>,
    pub unique_filename: Option<bool>,
    pub notification_url: Option<String>,
    pub context: BTreeMap<String, String>,
    pub faces: Option<bool>,
    pub colors: Option<bool>,
    pub image_metadata: Option<bool>,
    pub phash: Option<bool>,
    pub custom_coordinates: Vec<Region>,
    pub face_coordinates: Vec<Region>,
    pub detection: Option<String>,
    pub moderation: Option<String>,
    /// Pre-computed signature; used instead of signing with the API secret
    pub signature: Option<Signature>,
    /// Parameters without a dedicated field
    pub extra: HashMap<String, String>,
}

impl UploadParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn upload_preset(mut self, preset: impl Into<String>) -> Self {
        self.upload_preset = Some(preset.into());
        self
    }

    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn delivery_type(mut self, delivery_type: DeliveryType) -> Self {
        self.delivery_type = Some(delivery_type);
        self
    }

    pub fn transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn custom_coordinates(mut self, regions: Vec<Region>) -> Self {
        self.custom_coordinates = regions;
        self
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Form parameters of the request, before signing
    pub fn to_request_params(&self) -> Result<RequestParams, NetworkError> {
        let mut params = RequestParams::new();
        let mut text = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                params.insert(key.to_string(), RequestParam::Text(value.clone()));
            }
        };
        text("public_id", &self.public_id);
        text("folder", &self.folder);
        text("upload_preset", &self.upload_preset);
        text("format", &self.format);
        text("notification_url", &self.notification_url);
        text("detection", &self.detection);
        text("moderation", &self.moderation);

        let flags = [
            ("overwrite", self.overwrite),
            ("invalidate", self.invalidate),
            ("use_filename", self.use_filename),
            ("unique_filename", self.unique_filename),
            ("faces", self.faces),
            ("colors", self.colors),
            ("image_metadata", self.image_metadata),
            ("phash", self.phash),
        ];
        for (key, flag) in flags {
            if let Some(flag) = flag {
                params.insert(key.to_string(), RequestParam::Flag(flag));
            }
        }

        if let Some(delivery_type) = &self.delivery_type {
            params.insert("type".to_string(), delivery_type.as_str().into());
        }
        if !self.tags.is_empty() {
            params.insert("tags".to_string(), RequestParam::Text(self.tags.join(",")));
        }
        if !self.context.is_empty() {
            let context = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.replace('=', "\\=").replace('|', "\\|")))
                .collect::<Vec<_>>()
                .join("|");
            params.insert("context".to_string(), RequestParam::Text(context));
        }
        if !self.custom_coordinates.is_empty() {
            params.insert(
                "custom_coordinates".to_string(),
                RequestParam::Text(regions_param(&self.custom_coordinates)),
            );
        }
        if !self.face_coordinates.is_empty() {
            params.insert(
                "face_coordinates".to_string(),
                RequestParam::Text(regions_param(&self.face_coordinates)),
            );
        }
        if let Some(transformation) = &self.transformation {
            let value = transformation
                .to_url_string()
                .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
            params.insert("transformation".to_string(), RequestParam::Text(value));
        }
        for (key, value) in &self.extra {
            params.insert(key.clone(), RequestParam::Text(value.clone()));
        }
        Ok(params)
    }
}

/// `{api_base_url}/v1_1/{cloud}/{resource_type}/{action}`
pub(crate) fn api_url(config: &CloudConfig, resource_type: &ResourceType, action: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        config.api_base_url.trim_end_matches('/'),
        API_VERSION,
        config.cloud_name,
        resource_type.as_str(),
        action
    )
}

/// Add `timestamp`, `api_key` and `signature` to `params`. A pre-computed
/// signature wins over signing with the configured secret.
pub(crate) fn sign_request(
    config: &CloudConfig,
    params: &mut RequestParams,
    signature: Option<&Signature>,
) -> Result<(), NetworkError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| NetworkError::InvalidRequest("Must supply api_key".to_string()))?;

    match signature {
        Some(signature) => {
            params.insert("timestamp".to_string(), signature.timestamp.to_string().into());
            params.insert("signature".to_string(), signature.signature.clone().into());
        }
        None => {
            let secret = config.api_secret.as_deref().ok_or_else(|| {
                NetworkError::InvalidRequest("Must supply api_secret".to_string())
            })?;
            let timestamp = chrono::Utc::now().timestamp();
            params.insert("timestamp".to_string(), timestamp.to_string().into());
            let digest = api_sign_request(params, secret, SignatureAlgorithm::Sha1);
            params.insert("signature".to_string(), digest.into());
        }
    }
    params.insert("api_key".to_string(), api_key.into());
    Ok(())
}

#[derive(Clone)]
pub struct Uploader {
    config: Arc<CloudConfig>,
    network: Arc<dyn NetworkAdapter>,
}

impl Uploader {
    pub fn new(config: Arc<CloudConfig>, network: Arc<dyn NetworkAdapter>) -> Self {
        Self { config, network }
    }

    /// Prepare the URL and signed parameters of an upload
    pub fn prepare(
        &self,
        params: &UploadParams,
        signed: bool,
    ) -> Result<(String, RequestParams), NetworkError> {
        let mut request = params.to_request_params()?;
        if signed {
            sign_request(&self.config, &mut request, params.signature.as_ref())?;
        } else if params.upload_preset.is_none() {
            return Err(NetworkError::InvalidRequest(
                "Must supply upload_preset for unsigned upload".to_string(),
            ));
        }
        let url = api_url(&self.config, &params.resource_type, "upload");
        Ok((url, request))
    }

    /// Upload `payload`
    pub fn upload(
        &self,
        payload: UploadPayload,
        params: UploadParams,
        signed: bool,
        progress: Option<ProgressHandler>,
    ) -> Transfer<UploadResult> {
        let (url, request) = match self.prepare(&params, signed) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(error = %e, "Upload rejected");
                return Transfer::completed(Err(e));
            }
        };

        let network = self.network.clone();
        Transfer::spawn(progress, move |ctx| async move {
            tracing::debug!(url = %url, "Uploading");
            let json = network.upload(&url, &[], &request, &payload, &ctx).await?;
            results::from_json(json)
        })
    }

    /// Unsigned upload authorized by `upload_preset`
    pub fn upload_unsigned(
        &self,
        payload: UploadPayload,
        upload_preset: &str,
        params: UploadParams,
        progress: Option<ProgressHandler>,
    ) -> Transfer<UploadResult> {
        self.upload(payload, params.upload_preset(upload_preset), false, progress)
    }
}
