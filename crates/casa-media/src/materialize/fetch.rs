use super::fs::local_path;
use super::StrategyError;
use crate::validator::ValidationError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use casa_core::constants::DEFAULT_MAX_UPLOAD_BYTES;
use reqwest::Client;
use std::time::Duration;

/// Bytes returned by a [`UriFetcher`], with the content type the transport reported.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBytes {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Resolve a URI to bytes, the way a platform `fetch` would.
#[async_trait]
pub trait UriFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, StrategyError>;
}

/// Fetcher supporting `http(s)://`, `data:` and `file://` URIs.
///
/// HTTP bodies are read chunk by chunk and abandoned as soon as they pass
/// `max_bytes`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, StrategyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StrategyError::Fetch(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, size: u64) -> StrategyError {
        StrategyError::Invalid(ValidationError::TooLarge {
            size,
            max: self.max_bytes,
        })
    }

    async fn fetch_http(&self, uri: &str) -> Result<FetchedBytes, StrategyError> {
        let mut response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| StrategyError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StrategyError::Fetch(format!("HTTP {} for {}", status, uri)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(self.too_large(declared));
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| StrategyError::Fetch(e.to_string()))?
        {
            let size = (data.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(self.too_large(size));
            }
            data.extend_from_slice(&chunk);
        }

        Ok(FetchedBytes { data, content_type })
    }
}

/// Decode a `data:[<mediatype>][;base64],<data>` URI.
fn decode_data_uri(uri: &str) -> Result<FetchedBytes, StrategyError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| StrategyError::Decode("not a data URI".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| StrategyError::Decode("data URI without payload".to_string()))?;

    let is_base64 = meta.ends_with(";base64");
    let media_type = meta.trim_end_matches(";base64");
    let content_type = media_type
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .map(String::from);

    let data = if is_base64 {
        general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StrategyError::Decode(e.to_string()))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(FetchedBytes { data, content_type })
}

#[async_trait]
impl UriFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, StrategyError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch_http(uri).await;
        }

        if uri.starts_with("data:") {
            return decode_data_uri(uri);
        }

        if uri.starts_with("file://") {
            let path = local_path(uri)
                .ok_or_else(|| StrategyError::Unavailable(format!("Invalid file URI: {}", uri)))?;
            let data = tokio::fs::read(&path).await?;
            return Ok(FetchedBytes {
                data,
                content_type: None,
            });
        }

        Err(StrategyError::Unavailable(format!(
            "Unsupported URI scheme: {}",
            uri.split(':').next().unwrap_or(uri)
        )))
    }
}
