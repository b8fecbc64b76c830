use super::fetch::UriFetcher;
use super::fs::{local_path, MediaFileSystem};
use super::{resolve_content_type, MaterializeStrategy, StrategyError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use casa_core::constants::DEFAULT_IMAGE_CONTENT_TYPE;
use casa_core::models::{BytePayload, ImageHandle, TransformOptions};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::sync::Arc;

/// Decode `data`, scale it down to fit `max_width x max_height` (aspect
/// preserved, never upscaled) and re-encode it as JPEG.
///
/// Returns the JPEG bytes and the output dimensions.
pub fn resize_to_jpeg(
    data: &[u8],
    transform: &TransformOptions,
) -> Result<(Vec<u8>, u32, u32), StrategyError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| StrategyError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| StrategyError::Decode(e.to_string()))?;

    let (width, height) = img.dimensions();
    let img = if width > transform.max_width || height > transform.max_height {
        img.resize(transform.max_width, transform.max_height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (out_width, out_height) = rgb.dimensions();

    let mut buffer = Vec::with_capacity((out_width * out_height) as usize / 4);
    let encoder = JpegEncoder::new_with_quality(&mut buffer, transform.jpeg_quality());
    rgb.write_with_encoder(encoder)
        .map_err(|e| StrategyError::Transform(e.to_string()))?;

    Ok((buffer, out_width, out_height))
}

/// Local path of the handle, or an `Unavailable` error for non-file URIs.
fn require_local_path(handle: &ImageHandle) -> Result<std::path::PathBuf, StrategyError> {
    local_path(&handle.uri).ok_or_else(|| {
        StrategyError::Unavailable(format!("No local file behind {}", handle.uri))
    })
}

/// Read the local file, shrink it and normalize it to JPEG.
pub struct ResizeTransform {
    files: Arc<dyn MediaFileSystem>,
}

impl ResizeTransform {
    pub fn new(files: Arc<dyn MediaFileSystem>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl MaterializeStrategy for ResizeTransform {
    fn name(&self) -> &'static str {
        "resize_transform"
    }

    async fn attempt(
        &self,
        handle: &ImageHandle,
        transform: &TransformOptions,
    ) -> Result<BytePayload, StrategyError> {
        let path = require_local_path(handle)?;
        let source = self.files.read(&path).await?;
        let transform = *transform;

        let (data, width, height) =
            tokio::task::spawn_blocking(move || resize_to_jpeg(&source, &transform))
                .await
                .map_err(|e| StrategyError::Transform(format!("Transform task failed: {}", e)))??;

        Ok(BytePayload {
            data,
            content_type: DEFAULT_IMAGE_CONTENT_TYPE.to_string(),
            width: Some(width),
            height: Some(height),
            strategy: self.name(),
        })
    }
}

/// Read the local file as base64 and decode it, without touching pixels.
pub struct RawFileRead {
    files: Arc<dyn MediaFileSystem>,
}

impl RawFileRead {
    pub fn new(files: Arc<dyn MediaFileSystem>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl MaterializeStrategy for RawFileRead {
    fn name(&self) -> &'static str {
        "raw_file_read"
    }

    async fn attempt(
        &self,
        handle: &ImageHandle,
        _transform: &TransformOptions,
    ) -> Result<BytePayload, StrategyError> {
        let path = require_local_path(handle)?;
        if !self.files.exists(&path).await {
            return Err(StrategyError::Unavailable(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let encoded = self.files.read_base64(&path).await?;
        let data = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| StrategyError::Decode(e.to_string()))?;

        let content_type = resolve_content_type(None, handle, &data);
        Ok(BytePayload {
            data,
            content_type,
            width: handle.width,
            height: handle.height,
            strategy: self.name(),
        })
    }
}

/// URI rewrites tried by [`BestEffortFetch`], in order, without duplicates.
///
/// 1. the original URI
/// 2. `file://` stripped
/// 3. `file://` added to a bare path
/// 4. `file://` replaced by `content://`
pub fn candidate_uris(uri: &str) -> Vec<String> {
    let mut candidates = vec![uri.to_string()];

    if let Some(rest) = uri.strip_prefix("file://") {
        candidates.push(rest.to_string());
        candidates.push(format!("content://{}", rest));
    } else if uri.starts_with('/') {
        candidates.push(format!("file://{}", uri));
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| !c.is_empty() && seen.insert(c.clone()));
    candidates
}

/// Fetch the URI, then each rewrite of it, until one returns bytes.
pub struct BestEffortFetch {
    fetcher: Arc<dyn UriFetcher>,
}

impl BestEffortFetch {
    pub fn new(fetcher: Arc<dyn UriFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl MaterializeStrategy for BestEffortFetch {
    fn name(&self) -> &'static str {
        "best_effort_fetch"
    }

    async fn attempt(
        &self,
        handle: &ImageHandle,
        _transform: &TransformOptions,
    ) -> Result<BytePayload, StrategyError> {
        let mut last_error = None;

        for candidate in candidate_uris(&handle.uri) {
            match self.fetcher.fetch(&candidate).await {
                Ok(fetched) if !fetched.data.is_empty() => {
                    let content_type =
                        resolve_content_type(fetched.content_type.as_deref(), handle, &fetched.data);
                    return Ok(BytePayload {
                        data: fetched.data,
                        content_type,
                        width: handle.width,
                        height: handle.height,
                        strategy: self.name(),
                    });
                }
                Ok(_) => {
                    tracing::debug!(uri = %candidate, "Fetch returned no bytes");
                    last_error = Some(StrategyError::Fetch(format!("Empty response for {}", candidate)));
                }
                Err(e) => {
                    tracing::debug!(uri = %candidate, error = %e, "Fetch rewrite failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| StrategyError::Unavailable(handle.uri.clone())))
    }
}

/// Single fetch of the URI as given.
pub struct DirectFetch {
    fetcher: Arc<dyn UriFetcher>,
}

impl DirectFetch {
    pub fn new(fetcher: Arc<dyn UriFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl MaterializeStrategy for DirectFetch {
    fn name(&self) -> &'static str {
        "direct_fetch"
    }

    async fn attempt(
        &self,
        handle: &ImageHandle,
        _transform: &TransformOptions,
    ) -> Result<BytePayload, StrategyError> {
        let fetched = self.fetcher.fetch(&handle.uri).await?;
        let content_type =
            resolve_content_type(fetched.content_type.as_deref(), handle, &fetched.data);

        Ok(BytePayload {
            data: fetched.data,
            content_type,
            width: handle.width,
            height: handle.height,
            strategy: self.name(),
        })
    }
}
