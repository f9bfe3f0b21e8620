//! Transport collaborator
//!
//! The SDK never talks HTTP directly. Uploads, API calls and downloads go
//! through a [`NetworkAdapter`]; [`ReqwestAdapter`] is the default one.
//! Every operation runs as a [`Transfer`], a one-shot handle that can be
//! suspended, resumed or cancelled and awaited by any number of callers.

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

mod reqwest_adapter;
mod transfer;

pub use reqwest_adapter::ReqwestAdapter;
pub use transfer::{Progress, ProgressHandler, Transfer, TransferContext};

/// Errors surfaced by transfers. Cloneable so every waiter on a transfer
/// observes the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with an error payload or status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading a local upload payload failed
    #[error("Failed to read upload payload: {0}")]
    Payload(String),

    /// Downloaded bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Request parameters were rejected before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transfer was cancelled")]
    Cancelled,
}

/// A multipart/form request parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestParam {
    Text(String),
    /// Sent as repeated `key[]` fields, signed as a comma-joined value
    List(Vec<String>),
    Flag(bool),
}

impl RequestParam {
    /// Value used in the API request signature
    pub fn to_sign_value(&self) -> String {
        match self {
            RequestParam::Text(value) => value.clone(),
            RequestParam::List(values) => values.join(","),
            RequestParam::Flag(flag) => flag.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParam::Text(value) => value.is_empty(),
            RequestParam::List(values) => values.is_empty(),
            RequestParam::Flag(_) => false,
        }
    }
}

impl From<&str> for RequestParam {
    fn from(value: &str) -> Self {
        RequestParam::Text(value.to_string())
    }
}

impl From<String> for RequestParam {
    fn from(value: String) -> Self {
        RequestParam::Text(value)
    }
}

impl From<bool> for RequestParam {
    fn from(value: bool) -> Self {
        RequestParam::Flag(value)
    }
}

impl From<Vec<String>> for RequestParam {
    fn from(values: Vec<String>) -> Self {
        RequestParam::List(values)
    }
}

/// Request parameters, ordered by name
pub type RequestParams = BTreeMap<String, RequestParam>;

static REMOTE_URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn remote_url_regex() -> &'static Regex {
    REMOTE_URL_REGEX.get_or_init(|| {
        Regex::new(r"^ftp:|^https?:|^s3:|^data:[^;]*;base64,")
            .expect("Invalid remote url regex - this is a compile-time bug")
    })
}

/// The `file` part of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    Bytes(Bytes),
    /// Local file, streamed from disk
    File(PathBuf),
    /// Remote URL or data URI fetched by the server; sent as a plain field
    Url(String),
}

impl UploadPayload {
    /// Classify a string: remote URLs and data URIs stay URLs, anything else
    /// is treated as a local path.
    pub fn from_source(source: &str) -> Self {
        if is_remote_url(source) {
            UploadPayload::Url(source.to_string())
        } else {
            UploadPayload::File(PathBuf::from(source))
        }
    }
}

/// `ftp:`, `http(s):`, `s3:` or a base64 `data:` URI
pub fn is_remote_url(source: &str) -> bool {
    remote_url_regex().is_match(source)
}

/// HTTP transport used by the uploader, management API and downloader
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
    /// POST form parameters and parse the JSON response
    async fn request(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &RequestParams,
        ctx: &TransferContext,
    ) -> Result<serde_json::Value, NetworkError>;

    /// Multipart upload of `payload` with form parameters
    async fn upload(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &RequestParams,
        payload: &UploadPayload,
        ctx: &TransferContext,
    ) -> Result<serde_json::Value, NetworkError>;

    /// GET raw bytes
    async fn download(&self, url: &str, ctx: &TransferContext) -> Result<Bytes, NetworkError>;
}

/// Map an API JSON body to a result, turning `{"error": {"message": ...}}`
/// payloads and non-success statuses into [`NetworkError::Api`].
pub fn parse_api_response(status: u16, body: &[u8]) -> Result<serde_json::Value, NetworkError> {
    let json: serde_json::Value = match serde_json::from_slice(body) {
        Ok(json) => json,
        Err(e) => {
            if (200..300).contains(&status) {
                return Err(NetworkError::InvalidResponse(e.to_string()));
            }
            return Err(NetworkError::Api {
                status,
                message: String::from_utf8_lossy(body).trim().to_string(),
            });
        }
    };

    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(NetworkError::Api { status, message });
    }

    if !(200..300).contains(&status) {
        return Err(NetworkError::Api {
            status,
            message: format!("unexpected HTTP status {}", status),
        });
    }

    if !json.is_object() {
        return Err(NetworkError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }

    Ok(json)
}
