//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
///
/// Backends classify failures when they happen (HTTP status, SDK error kind,
/// io error kind), so callers match on variants instead of parsing messages.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-object options sent with an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOptions {
    pub content_type: String,
    /// `max-age` in seconds
    pub cache_control_secs: u64,
    /// Overwrite an existing object at the same path
    pub upsert: bool,
}

impl ObjectOptions {
    /// Create-only options: an existing object at the path fails the upload.
    pub fn create_only(content_type: impl Into<String>, cache_control_secs: u64) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control_secs,
            upsert: false,
        }
    }

    pub fn cache_control_header(&self) -> String {
        format!("max-age={}", self.cache_control_secs)
    }
}

/// Storage abstraction trait
///
/// All storage backends (hosted REST API, S3, local filesystem) implement this
/// trait so the image pipeline never couples to a specific backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload `data` to `bucket` at `path`.
    ///
    /// With `options.upsert == false` the upload must fail with
    /// [`StorageError::AlreadyExists`] rather than overwrite an existing object.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &ObjectOptions,
    ) -> StorageResult<()>;

    /// Public URL of an object. Pure: no network round trip.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Object path of a URL previously returned by [`Storage::public_url`].
    fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        crate::keys::object_path_from_public_url(&self.public_url(bucket, ""), public_url)
    }

    /// Delete objects from a bucket. Missing objects are not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
