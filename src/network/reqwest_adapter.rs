// Default transport backed by reqwest

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use super::{
    parse_api_response, NetworkAdapter, NetworkError, Progress, RequestParam, RequestParams,
    TransferContext, UploadPayload,
};
use crate::config::NetworkSettings;
use crate::constants::USER_AGENT_PRODUCT;

/// Upload bodies are streamed in chunks of this size so progress can be
/// reported while sending.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// `CloudinaryRust/{version}`, optionally prefixed by `Platform/version`
pub fn user_agent(platform: Option<&str>) -> String {
    let product = format!("{}/{}", USER_AGENT_PRODUCT, env!("CARGO_PKG_VERSION"));
    match platform.map(str::trim).filter(|p| !p.is_empty()) {
        Some(platform) => format!("{} {}", platform, product),
        None => product,
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
}

impl ReqwestAdapter {
    pub fn new(settings: &NetworkSettings) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(user_agent(settings.user_platform.as_deref()))
            .build()
            .map_err(|e| NetworkError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn form_pairs(params: &RequestParams) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(params.len());
        for (name, value) in params {
            match value {
                RequestParam::Text(text) => pairs.push((name.clone(), text.clone())),
                RequestParam::Flag(flag) => pairs.push((name.clone(), flag.to_string())),
                RequestParam::List(items) => {
                    for item in items {
                        pairs.push((format!("{}[]", name), item.clone()));
                    }
                }
            }
        }
        pairs
    }

    fn apply_headers(
        mut builder: reqwest::RequestBuilder,
        headers: &[(String, String)],
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    async fn read_response(response: reqwest::Response) -> Result<serde_json::Value, NetworkError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(format!("Failed to read response body: {}", e)))?;
        parse_api_response(status, &body)
    }

    /// Wrap `data` in a body that reports progress as chunks are consumed
    fn progress_body(data: Bytes, ctx: &TransferContext) -> (reqwest::Body, u64) {
        let total = data.len() as u64;
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
            .collect();

        let ctx = ctx.clone();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            ctx.report(Progress {
                bytes: chunk.len() as u64,
                total_bytes: sent,
                total_bytes_expected: Some(total),
            });
            Ok::<Bytes, std::io::Error>(chunk)
        });

        (reqwest::Body::wrap_stream(stream), total)
    }
}

#[async_trait]
impl NetworkAdapter for ReqwestAdapter {
    async fn request(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &RequestParams,
        ctx: &TransferContext,
    ) -> Result<serde_json::Value, NetworkError> {
        ctx.checkpoint().await?;
        let builder = Self::apply_headers(self.client.post(url), headers)
            .form(&Self::form_pairs(params));
        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Self::read_response(response).await
    }

    async fn upload(
        &self,
        url: &str,
        headers: &[(String, String)],
        params: &RequestParams,
        payload: &UploadPayload,
        ctx: &TransferContext,
    ) -> Result<serde_json::Value, NetworkError> {
        let mut form = Form::new();
        for (name, value) in Self::form_pairs(params) {
            form = form.text(name, value);
        }

        form = match payload {
            UploadPayload::Url(source) => form.text("file", source.clone()),
            UploadPayload::Bytes(data) => {
                let (body, len) = Self::progress_body(data.clone(), ctx);
                form.part("file", Part::stream_with_length(body, len).file_name("file"))
            }
            UploadPayload::File(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|e| NetworkError::Payload(format!("{}: {}", path.display(), e)))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                let (body, len) = Self::progress_body(Bytes::from(data), ctx);
                form.part("file", Part::stream_with_length(body, len).file_name(file_name))
            }
        };

        ctx.checkpoint().await?;
        let response = Self::apply_headers(self.client.post(url), headers)
            .multipart(form)
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Self::read_response(response).await
    }

    async fn download(&self, url: &str, ctx: &TransferContext) -> Result<Bytes, NetworkError> {
        ctx.checkpoint().await?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Api {
                status: status.as_u16(),
                message: format!("download failed with status {}", status),
            });
        }

        let expected = response.content_length();
        let mut buffer = BytesMut::with_capacity(expected.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::Transport(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
            ctx.report(Progress {
                bytes: chunk.len() as u64,
                total_bytes: buffer.len() as u64,
                total_bytes_expected: expected,
            });
            ctx.checkpoint().await?;
        }

        Ok(buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_without_platform() {
        let agent = user_agent(None);
        assert!(agent.starts_with("CloudinaryRust/"));
        assert!(!agent.contains(' '));
    }

    #[test]
    fn test_user_agent_with_platform_prefix() {
        let agent = user_agent(Some("MyApp/1.2"));
        assert!(agent.starts_with("MyApp/1.2 CloudinaryRust/"));
        assert_eq!(user_agent(Some("  ")), user_agent(None));
    }

    #[test]
    fn test_form_pairs_expand_lists() {
        let mut params = RequestParams::new();
        params.insert("tags".to_string(), RequestParam::List(vec!["a".into(), "b".into()]));
        params.insert("overwrite".to_string(), RequestParam::Flag(true));
        params.insert("public_id".to_string(), RequestParam::Text("sample".into()));

        let pairs = ReqwestAdapter::form_pairs(&params);
        assert_eq!(
            pairs,
            vec![
                ("overwrite".to_string(), "true".to_string()),
                ("public_id".to_string(), "sample".to_string()),
                ("tags[]".to_string(), "a".to_string()),
                ("tags[]".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_adapter_builds_with_default_settings() {
        assert!(ReqwestAdapter::new(&NetworkSettings::default()).is_ok());
    }
}
