//! Classified pipeline errors.
//!
//! Backends already report a closed [`StorageError`]; this module maps those
//! variants (plus picker and materialization failures) onto the categories a
//! screen can present.

use crate::acquisition::PickerError;
use crate::materialize::MaterializeError;
use crate::validator::ValidationError;
use casa_core::{ErrorMetadata, LogLevel};
use casa_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Storage bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Image too large: {0}")]
    PayloadTooLarge(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Session expired: {0}")]
    AuthExpired(String),

    #[error(transparent)]
    Materialization(MaterializeError),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error("Upload failed: {0}")]
    Unknown(String),
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BucketNotFound(msg) => UploadError::BucketNotFound(msg),
            StorageError::PermissionDenied(msg) => UploadError::PermissionDenied(msg),
            StorageError::PayloadTooLarge(msg) => UploadError::PayloadTooLarge(msg),
            StorageError::Network(msg) => UploadError::Network(msg),
            StorageError::AuthExpired(msg) => UploadError::AuthExpired(msg),
            other @ (StorageError::AlreadyExists(_)
            | StorageError::NotFound(_)
            | StorageError::InvalidKey(_)
            | StorageError::BackendError(_)
            | StorageError::IoError(_)
            | StorageError::ConfigError(_)) => UploadError::Unknown(other.to_string()),
        }
    }
}

impl From<MaterializeError> for UploadError {
    fn from(err: MaterializeError) -> Self {
        match err {
            MaterializeError::TooLarge { .. } => UploadError::PayloadTooLarge(err.to_string()),
            other => UploadError::Materialization(other),
        }
    }
}

impl From<ValidationError> for UploadError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::TooLarge { .. } => UploadError::PayloadTooLarge(err.to_string()),
            ValidationError::Empty => UploadError::Unknown(err.to_string()),
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::BucketNotFound(_) => "BUCKET_NOT_FOUND",
            UploadError::PermissionDenied(_) => "PERMISSION_DENIED",
            UploadError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            UploadError::Network(_) => "NETWORK_ERROR",
            UploadError::AuthExpired(_) => "AUTH_EXPIRED",
            UploadError::Materialization(_) => "IMAGE_UNREADABLE",
            UploadError::Picker(_) => "PICKER_FAILED",
            UploadError::Unknown(_) => "UPLOAD_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::Network(_)
                | UploadError::AuthExpired(_)
                | UploadError::PayloadTooLarge(_)
                | UploadError::Materialization(_)
                | UploadError::Picker(_)
                | UploadError::Unknown(_)
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            UploadError::BucketNotFound(_) => Some("Contact support: image storage is not set up"),
            UploadError::PermissionDenied(_) => {
                Some("Sign in with an account that can manage the catalog")
            }
            UploadError::PayloadTooLarge(_) => Some("Choose a smaller image"),
            UploadError::Network(_) => Some("Check your internet connection and try again"),
            UploadError::AuthExpired(_) => Some("Sign in again"),
            UploadError::Materialization(_) => Some("Pick a different image or restart the app"),
            UploadError::Picker(_) => Some("Try again"),
            UploadError::Unknown(_) => Some("Try again"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::BucketNotFound(_) => {
                "The image storage bucket does not exist.".to_string()
            }
            UploadError::PermissionDenied(_) => {
                "You do not have permission to upload images here.".to_string()
            }
            UploadError::PayloadTooLarge(_) => "The image is too large to upload.".to_string(),
            UploadError::Network(_) => {
                "Could not reach the server while uploading the image.".to_string()
            }
            UploadError::AuthExpired(_) => "Your session has expired.".to_string(),
            UploadError::Materialization(err) => err.to_string(),
            UploadError::Picker(_) => "The photo library could not be opened.".to_string(),
            UploadError::Unknown(_) => "The image could not be uploaded.".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Network(_) | UploadError::AuthExpired(_) => LogLevel::Warn,
            UploadError::PayloadTooLarge(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casa_core::models::Platform;

    #[test]
    fn test_storage_errors_map_by_variant() {
        let cases = [
            (StorageError::BucketNotFound("x".into()), "BUCKET_NOT_FOUND"),
            (StorageError::PermissionDenied("x".into()), "PERMISSION_DENIED"),
            (StorageError::PayloadTooLarge("x".into()), "PAYLOAD_TOO_LARGE"),
            (StorageError::Network("x".into()), "NETWORK_ERROR"),
            (StorageError::AuthExpired("x".into()), "AUTH_EXPIRED"),
            (StorageError::AlreadyExists("x".into()), "UPLOAD_FAILED"),
            (StorageError::BackendError("x".into()), "UPLOAD_FAILED"),
        ];
        for (storage_err, code) in cases {
            assert_eq!(UploadError::from(storage_err).error_code(), code);
        }
    }

    #[test]
    fn test_messages_are_distinct() {
        let errors = [
            UploadError::BucketNotFound(String::new()),
            UploadError::PermissionDenied(String::new()),
            UploadError::PayloadTooLarge(String::new()),
            UploadError::Network(String::new()),
            UploadError::AuthExpired(String::new()),
            UploadError::Materialization(MaterializeError::Exhausted {
                platform: Platform::Ios,
                attempts: vec!["resize_transform".to_string()],
            }),
            UploadError::Picker(PickerError::Unavailable),
            UploadError::Unknown(String::new()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(|e| e.client_message()).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_materialize_size_error_is_payload_too_large() {
        let err = UploadError::from(MaterializeError::TooLarge { size: 2, max: 1 });
        assert!(matches!(err, UploadError::PayloadTooLarge(_)));
        assert!(!UploadError::BucketNotFound(String::new()).is_recoverable());
    }
}
