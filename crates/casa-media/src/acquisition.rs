//! Source acquisition: platform media picker and handle normalization.

use async_trait::async_trait;
use casa_core::models::{ImageHandle, ImageUploadOptions};
use casa_storage::content_type_for_extension;
use std::path::{Path, PathBuf};

/// Picker errors. Denial and cancellation are not errors; see [`PickOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("Media picker failed: {0}")]
    Failed(String),

    #[error("No media picker is available on this platform")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// What the picker is asked to show.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerConfig {
    pub allows_editing: bool,
    pub aspect: Option<(u32, u32)>,
    /// Compression quality hint in `0.0..=1.0`
    pub quality: f32,
    pub selection_limit: u32,
}

impl From<&ImageUploadOptions> for PickerConfig {
    fn from(options: &ImageUploadOptions) -> Self {
        Self {
            allows_editing: options.allows_editing,
            aspect: options.aspect_ratio,
            quality: options.quality.clamp(0.0, 1.0),
            selection_limit: 1,
        }
    }
}

/// Platform media library picker.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, PickerError>;

    /// Show the picker. `None` means the user dismissed it.
    async fn pick(&self, config: &PickerConfig) -> Result<Option<ImageHandle>, PickerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Selected(ImageHandle),
    Cancelled,
    PermissionDenied,
}

/// Ask for media library permission, then let the user pick one image.
pub async fn acquire_image(
    picker: &dyn MediaPicker,
    options: &ImageUploadOptions,
) -> Result<PickOutcome, PickerError> {
    match picker.request_permission().await? {
        PermissionStatus::Granted => {}
        status => {
            tracing::info!(status = ?status, "Media library permission not granted");
            return Ok(PickOutcome::PermissionDenied);
        }
    }

    let config = PickerConfig::from(options);
    match picker.pick(&config).await? {
        Some(handle) => {
            tracing::debug!(
                uri = %handle.uri,
                width = ?handle.width,
                height = ?handle.height,
                mime_type = ?handle.mime_type,
                "Image selected"
            );
            Ok(PickOutcome::Selected(handle))
        }
        None => {
            tracing::debug!("Image picker dismissed");
            Ok(PickOutcome::Cancelled)
        }
    }
}

/// Picker for desktop and command-line runtimes.
///
/// The "selection" is a file path supplied up front; no path behaves like a
/// dismissed picker. Permission is always granted.
#[derive(Debug, Clone, Default)]
pub struct FilePicker {
    path: Option<PathBuf>,
}

impl FilePicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

fn file_uri(path: &Path) -> String {
    let encoded = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("file://{}", encoded)
}

#[async_trait]
impl MediaPicker for FilePicker {
    async fn request_permission(&self) -> Result<PermissionStatus, PickerError> {
        Ok(PermissionStatus::Granted)
    }

    async fn pick(&self, _config: &PickerConfig) -> Result<Option<ImageHandle>, PickerError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        let path = tokio::fs::canonicalize(path).await?;
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(PickerError::Failed(format!(
                "{} is not a file",
                path.display()
            )));
        }

        let probe = path.clone();
        let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(&probe).ok())
            .await
            .map_err(|e| PickerError::Failed(format!("Dimension probe failed: {}", e)))?;

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(content_type_for_extension)
            .map(String::from);

        let mut handle = ImageHandle::new(file_uri(&path));
        handle.width = dimensions.map(|(w, _)| w);
        handle.height = dimensions.map(|(_, h)| h);
        handle.mime_type = mime_type;
        handle.file_size_bytes = Some(metadata.len());

        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    struct ScriptedPicker {
        permission: PermissionStatus,
        selection: Option<ImageHandle>,
    }

    #[async_trait]
    impl MediaPicker for ScriptedPicker {
        async fn request_permission(&self) -> Result<PermissionStatus, PickerError> {
            Ok(self.permission)
        }

        async fn pick(&self, config: &PickerConfig) -> Result<Option<ImageHandle>, PickerError> {
            assert_eq!(config.selection_limit, 1);
            Ok(self.selection.clone())
        }
    }

    #[tokio::test]
    async fn test_denied_and_undetermined_permission() {
        for permission in [PermissionStatus::Denied, PermissionStatus::Undetermined] {
            let picker = ScriptedPicker {
                permission,
                selection: Some(ImageHandle::new("file:///a.jpg")),
            };
            let outcome = acquire_image(&picker, &ImageUploadOptions::default())
                .await
                .unwrap();
            assert_eq!(outcome, PickOutcome::PermissionDenied);
        }
    }

    #[tokio::test]
    async fn test_cancelled_pick() {
        let picker = ScriptedPicker {
            permission: PermissionStatus::Granted,
            selection: None,
        };
        let outcome = acquire_image(&picker, &ImageUploadOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, PickOutcome::Cancelled);
    }

    #[test]
    fn test_picker_config_from_options() {
        let mut options = ImageUploadOptions::new("banners", "home");
        options.allows_editing = true;
        options.aspect_ratio = Some((16, 9));
        options.quality = 1.7;

        let config = PickerConfig::from(&options);
        assert!(config.allows_editing);
        assert_eq!(config.aspect, Some((16, 9)));
        assert_eq!(config.quality, 1.0);
    }

    #[tokio::test]
    async fn test_file_picker_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm chair.png");
        RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let picker = FilePicker::new(Some(path.clone()));
        let handle = picker
            .pick(&PickerConfig::from(&ImageUploadOptions::default()))
            .await
            .unwrap()
            .unwrap();

        assert!(handle.uri.starts_with("file:///"));
        assert!(handle.uri.ends_with("arm%20chair.png"));
        assert_eq!(handle.width, Some(40));
        assert_eq!(handle.height, Some(30));
        assert_eq!(handle.mime_type.as_deref(), Some("image/png"));
        assert_eq!(
            handle.file_size_bytes,
            Some(std::fs::metadata(&path).unwrap().len())
        );
    }

    #[tokio::test]
    async fn test_file_picker_without_path_is_cancelled() {
        let picker = FilePicker::new(None);
        let outcome = acquire_image(&picker, &ImageUploadOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, PickOutcome::Cancelled);
    }
}
