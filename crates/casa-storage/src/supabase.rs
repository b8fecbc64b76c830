//! Hosted backend-as-a-service object storage over its REST API.
//!
//! Endpoints used:
//! - `POST   {url}/storage/v1/object/{bucket}/{path}` (upload, `x-upsert` header)
//! - `DELETE {url}/storage/v1/object/{bucket}` (body `{"prefixes": [...]}`)
//! - public URL `{url}/storage/v1/object/public/{bucket}/{path}` (no request)

use crate::keys::validate_object_path;
use crate::traits::{ObjectOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Error body returned by the storage API.
///
/// The API reports the logical status in `statusCode` (as a string) and may
/// answer with HTTP 400 for errors that are really 404/409/413.
#[derive(Debug, Deserialize)]
struct StorageApiError {
    #[serde(rename = "statusCode")]
    status_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl SupabaseStorage {
    /// Create a new storage client
    ///
    /// # Arguments
    /// * `base_url` - project URL (e.g., "https://abc.supabase.co")
    /// * `api_key` - anon key sent as the `apikey` header
    /// * `bearer` - user session JWT, or the anon key for anonymous access
    /// * `timeout` - per-request timeout
    pub fn new(
        base_url: String,
        api_key: String,
        bearer: String,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bearer,
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    async fn error_from_response(response: reqwest::Response, context: &str) -> StorageError {
        let http_status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: Option<StorageApiError> = serde_json::from_str(&text).ok();
        classify_response(http_status, body.as_ref(), context, &text)
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Map a failed storage API response onto a [`StorageError`] variant.
fn classify_response(
    http_status: StatusCode,
    body: Option<&StorageApiError>,
    context: &str,
    raw: &str,
) -> StorageError {
    let logical_status = body
        .and_then(|b| b.status_code.as_deref())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(http_status.as_u16());
    let error_code = body.and_then(|b| b.error.as_deref()).unwrap_or_default();
    let detail = body
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| raw.to_string());
    let detail = format!("{} ({}): {}", context, logical_status, detail);

    if error_code == "InvalidJWT" {
        return StorageError::AuthExpired(detail);
    }

    match logical_status {
        401 => StorageError::AuthExpired(detail),
        403 => StorageError::PermissionDenied(detail),
        404 => StorageError::BucketNotFound(detail),
        409 => StorageError::AlreadyExists(detail),
        413 => StorageError::PayloadTooLarge(detail),
        502..=504 => StorageError::Network(detail),
        _ => StorageError::BackendError(detail),
    }
}

fn classify_transport(err: reqwest::Error) -> StorageError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        StorageError::Network(err.to_string())
    } else {
        StorageError::BackendError(err.to_string())
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &ObjectOptions,
    ) -> StorageResult<()> {
        validate_object_path(path)?;

        let size = data.len();
        let start = std::time::Instant::now();

        let request = self
            .client
            .post(self.object_url(bucket, path))
            .header("Content-Type", options.content_type.as_str())
            .header("cache-control", options.cache_control_header())
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(data);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response, "upload").await;
            tracing::error!(
                error = %err,
                bucket = %bucket,
                key = %path,
                size_bytes = size,
                "Storage upload failed"
            );
            return Err(err);
        }

        tracing::info!(
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Storage upload successful"
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        for path in paths {
            validate_object_path(path)?;
        }

        let url = format!(
            "{}/storage/v1/object/{}",
            self.base_url,
            urlencoding::encode(bucket)
        );
        let request = self
            .client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": paths }));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "remove").await);
        }

        tracing::info!(bucket = %bucket, count = paths.len(), "Storage delete successful");
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
