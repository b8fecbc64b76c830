//! Image upload pipeline: acquire → materialize → validate → upload → address.
//!
//! One image per call. Every call generates a fresh object path, so retrying
//! a failed upload never reuses the path of the failed attempt, and the
//! upload itself never overwrites an existing object.

use std::sync::Arc;
use std::time::Duration;

use casa_core::models::{
    ImageHandle, ImageMetadata, ImageUploadOptions, Platform, StorageTarget, UploadResult,
};
use casa_core::Config;
use casa_storage::{generate_object_path, ObjectOptions, Storage};

use crate::acquisition::{acquire_image, MediaPicker, PickOutcome, PickerError};
use crate::error::UploadError;
use crate::materialize::{HttpFetcher, MaterializationChain, TokioFileSystem};
use crate::validator::PayloadValidator;

pub struct ImageUploader {
    storage: Arc<dyn Storage>,
    chain: MaterializationChain,
    picker: Option<Arc<dyn MediaPicker>>,
    cache_control_secs: u64,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn Storage>, chain: MaterializationChain) -> Self {
        Self {
            storage,
            chain,
            picker: None,
            cache_control_secs: casa_core::constants::DEFAULT_CACHE_CONTROL_SECS,
        }
    }

    /// Uploader with the standard strategy chain for `platform`.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn Storage>,
        platform: Platform,
    ) -> Result<Self, UploadError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.http_timeout_secs))
            .map_err(|e| UploadError::Unknown(e.to_string()))?
            .with_max_bytes(config.max_upload_bytes);
        let chain = MaterializationChain::for_platform(
            platform,
            Arc::new(fetcher),
            Arc::new(TokioFileSystem),
            PayloadValidator::new(config.max_upload_bytes),
        );

        Ok(Self::new(storage, chain).with_cache_control(config.cache_control_secs))
    }

    pub fn with_picker(mut self, picker: Arc<dyn MediaPicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn with_cache_control(mut self, secs: u64) -> Self {
        self.cache_control_secs = secs;
        self
    }

    /// Let the user pick an image and upload it.
    ///
    /// Returns `Ok(None)` when the user denied library access or dismissed
    /// the picker.
    #[tracing::instrument(skip(self, options), fields(bucket = %options.bucket, folder = %options.folder))]
    pub async fn pick_and_upload_image(
        &self,
        options: &ImageUploadOptions,
    ) -> Result<Option<UploadResult>, UploadError> {
        let picker = self.picker.as_ref().ok_or(PickerError::Unavailable)?;

        match acquire_image(picker.as_ref(), options).await? {
            PickOutcome::Selected(handle) => self.upload_handle(&handle, options).await.map(Some),
            PickOutcome::Cancelled => {
                tracing::info!("Image selection cancelled");
                Ok(None)
            }
            PickOutcome::PermissionDenied => {
                tracing::info!("Media library permission denied");
                Ok(None)
            }
        }
    }

    /// Upload an image the caller already has a URI for.
    pub async fn upload_image_from_uri(
        &self,
        uri: &str,
        options: &ImageUploadOptions,
        metadata: Option<ImageMetadata>,
    ) -> Result<UploadResult, UploadError> {
        let handle = ImageHandle::new(uri).with_metadata(metadata.unwrap_or_default());
        self.upload_handle(&handle, options).await
    }

    #[tracing::instrument(
        skip(self, handle, options),
        fields(uri = %handle.uri, bucket = %options.bucket, platform = %self.chain.platform())
    )]
    pub async fn upload_handle(
        &self,
        handle: &ImageHandle,
        options: &ImageUploadOptions,
    ) -> Result<UploadResult, UploadError> {
        self.chain
            .validator()
            .check_declared_size(handle.file_size_bytes)?;

        let payload = self.chain.materialize(handle, &options.transform()).await?;

        let target = StorageTarget {
            bucket: options.bucket.clone(),
            path: generate_object_path(&options.folder, &payload.content_type),
        };
        let object_options = ObjectOptions::create_only(&payload.content_type, self.cache_control_secs);
        let width = payload.width.or(handle.width);
        let height = payload.height.or(handle.height);
        let size = payload.len();
        let strategy = payload.strategy;

        let start = std::time::Instant::now();
        if let Err(e) = self
            .storage
            .upload(&target.bucket, &target.path, payload.data, &object_options)
            .await
        {
            let err = UploadError::from(e);
            tracing::error!(
                error = %err,
                bucket = %target.bucket,
                path = %target.path,
                size_bytes = size,
                "Image upload failed"
            );
            return Err(err);
        }

        let public_url = self.storage.public_url(&target.bucket, &target.path);

        tracing::info!(
            bucket = %target.bucket,
            path = %target.path,
            size_bytes = size,
            content_type = %object_options.content_type,
            strategy = strategy,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image uploaded"
        );

        Ok(UploadResult {
            public_url,
            file_path: target.path,
            width,
            height,
        })
    }

    /// Delete a previously uploaded image. Failures are logged, never returned.
    pub async fn remove_image(&self, bucket: &str, public_url: &str) {
        let Some(path) = self.storage.object_path(bucket, public_url) else {
            tracing::warn!(
                bucket = %bucket,
                url = %public_url,
                "Could not derive object path from public URL, skipping delete"
            );
            return;
        };

        match self.storage.remove(bucket, std::slice::from_ref(&path)).await {
            Ok(()) => tracing::info!(bucket = %bucket, path = %path, "Image removed"),
            Err(e) => tracing::warn!(
                error = %e,
                bucket = %bucket,
                path = %path,
                "Failed to remove image"
            ),
        }
    }
}
