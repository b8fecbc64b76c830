//! Transient image models used by the acquisition and upload pipeline.
//!
//! None of these have a database identity: a handle lives only until its bytes
//! are materialized, and only the [`UploadResult`] is handed back to the caller.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMAGE_MAX_HEIGHT, DEFAULT_IMAGE_MAX_WIDTH, DEFAULT_IMAGE_QUALITY, PRODUCTS_BUCKET,
};

/// Metadata a picker (or a caller that already knows it) declares for an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
    pub file_size_bytes: Option<u64>,
}

/// Opaque platform reference to a locally selected image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub uri: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime_type: Option<String>,
    pub file_size_bytes: Option<u64>,
}

impl ImageHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width: None,
            height: None,
            mime_type: None,
            file_size_bytes: None,
        }
    }

    /// Attach declared metadata. Fields absent from `metadata` keep their value.
    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.width = metadata.width.or(self.width);
        self.height = metadata.height.or(self.height);
        self.mime_type = metadata.mime_type.or(self.mime_type);
        self.file_size_bytes = metadata.file_size_bytes.or(self.file_size_bytes);
        self
    }

    /// Lowercased extension of the last URI segment, if any.
    pub fn extension(&self) -> Option<String> {
        let without_query = self.uri.split(['?', '#']).next().unwrap_or(&self.uri);
        let last_segment = without_query.rsplit('/').next()?;
        let (_, ext) = last_segment.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

/// Materialized image content, ready for upload.
#[derive(Clone, PartialEq)]
pub struct BytePayload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Name of the materialization strategy that produced the bytes
    pub strategy: &'static str,
}

impl BytePayload {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for BytePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BytePayload")
            .field("size_bytes", &self.data.len())
            .field("content_type", &self.content_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Destination of an upload: logical bucket plus generated object path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTarget {
    pub bucket: String,
    pub path: String,
}

/// The only artifact that survives a pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub public_url: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Options for the in-process resize/recompress transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality hint in `0.0..=1.0`
    pub quality: f32,
}

impl TransformOptions {
    /// Reject zero bounds and a quality outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(anyhow::anyhow!(
                "max width and max height must be greater than zero"
            ));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(anyhow::anyhow!("quality must be between 0.0 and 1.0"));
        }
        Ok(())
    }

    /// Quality mapped onto the 1-100 scale used by JPEG encoders.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_IMAGE_MAX_WIDTH,
            max_height: DEFAULT_IMAGE_MAX_HEIGHT,
            quality: DEFAULT_IMAGE_QUALITY,
        }
    }
}

/// Caller-supplied options for one pick-and-upload invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUploadOptions {
    pub bucket: String,
    pub folder: String,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    /// Crop aspect ratio offered by the picker, e.g. `(4, 3)`
    pub aspect_ratio: Option<(u32, u32)>,
    /// Whether the picker offers an in-picker crop
    pub allows_editing: bool,
}

impl ImageUploadOptions {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: folder.into(),
            ..Self::default()
        }
    }

    pub fn transform(&self) -> TransformOptions {
        TransformOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
        }
    }
}

impl Default for ImageUploadOptions {
    fn default() -> Self {
        Self {
            bucket: PRODUCTS_BUCKET.to_string(),
            folder: "images".to_string(),
            max_width: DEFAULT_IMAGE_MAX_WIDTH,
            max_height: DEFAULT_IMAGE_MAX_HEIGHT,
            quality: DEFAULT_IMAGE_QUALITY,
            aspect_ratio: None,
            allows_editing: false,
        }
    }
}
