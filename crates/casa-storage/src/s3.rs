use crate::keys::validate_object_path;
use crate::traits::{ObjectOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutMode, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// S3 storage implementation
///
/// A single S3 bucket backs every logical bucket; the logical bucket name
/// becomes the first key segment (`{bucket}/{path}`).
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn object_key(bucket: &str, path: &str) -> String {
        format!("{}/{}", bucket, path)
    }

    /// Public URL for an object key.
    ///
    /// AWS uses the virtual-hosted form; custom endpoints use path-style
    /// `{endpoint}/{bucket}/{key}`.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

fn classify(err: ObjectStoreError, key: &str) -> StorageError {
    match err {
        ObjectStoreError::AlreadyExists { .. } => StorageError::AlreadyExists(key.to_string()),
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
        ObjectStoreError::PermissionDenied { .. } => StorageError::PermissionDenied(err.to_string()),
        ObjectStoreError::Unauthenticated { .. } => StorageError::AuthExpired(err.to_string()),
        other => StorageError::BackendError(other.to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &ObjectOptions,
    ) -> StorageResult<()> {
        validate_object_path(path)?;

        let key = Self::object_key(bucket, path);
        let size = data.len() as u64;
        let location = Path::from(key.clone());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, options.content_type.clone().into());
        attributes.insert(Attribute::CacheControl, options.cache_control_header().into());

        let put_options = PutOptions {
            mode: if options.upsert {
                PutMode::Overwrite
            } else {
                PutMode::Create
            },
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), put_options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            classify(e, &key)
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.generate_url(&Self::object_key(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            validate_object_path(path)?;
            let key = Self::object_key(bucket, path);
            let location = Path::from(key.clone());

            let result: ObjectResult<_> = self.store.delete(&location).await;
            match result {
                Ok(()) => {
                    tracing::info!(bucket = %self.bucket, key = %key, "S3 delete successful");
                }
                Err(ObjectStoreError::NotFound { .. }) => {}
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %key,
                        "S3 delete failed"
                    );
                    return Err(classify(e, &key));
                }
            }
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
