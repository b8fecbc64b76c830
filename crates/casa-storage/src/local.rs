use crate::keys::validate_object_path;
use crate::traits::{ObjectOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Each logical bucket is a directory under `base_path`. Buckets must be
/// created with [`LocalStorage::create_bucket`] before objects can be uploaded
/// into them, mirroring the hosted backend where buckets are provisioned by an
/// operator.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for bucket directories (e.g., "/var/lib/casa/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8080/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Create a bucket directory if it does not exist yet.
    pub async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;
        Ok(())
    }

    fn bucket_dir(&self, bucket: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }
        Ok(self.base_path.join(bucket))
    }

    /// Convert bucket + object path to a filesystem path with security validation
    fn object_to_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_object_path(path)?;
        let bucket_dir = self.bucket_dir(bucket)?;
        let full = bucket_dir.join(path);

        if full.strip_prefix(&bucket_dir).is_err() {
            return Err(StorageError::InvalidKey(
                "Object path resolves outside bucket directory".to_string(),
            ));
        }

        Ok(full)
    }

    /// Generate public URL for file
    fn generate_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket, path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &ObjectOptions,
    ) -> StorageResult<()> {
        let file_path = self.object_to_path(bucket, path)?;
        let bucket_dir = self.bucket_dir(bucket)?;
        if !fs::try_exists(&bucket_dir).await.unwrap_or(false) {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }

        let size = data.len();
        self.ensure_parent_dir(&file_path).await?;

        let start = std::time::Instant::now();

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.upsert {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&file_path).await.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(format!("{}/{}", bucket, path)),
            ErrorKind::PermissionDenied => StorageError::PermissionDenied(format!(
                "Cannot write {}: {}",
                file_path.display(),
                e
            )),
            _ => StorageError::IoError(e),
        })?;

        file.write_all(&data).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %file_path.display(),
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            content_type = %options.content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.generate_url(bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            let file_path = self.object_to_path(bucket, path)?;

            if !fs::try_exists(&file_path).await.unwrap_or(false) {
                continue;
            }

            fs::remove_file(&file_path).await?;

            tracing::info!(
                path = %file_path.display(),
                bucket = %bucket,
                key = %path,
                "Local storage delete successful"
            );
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
