//! Casa Media Library
//!
//! Gets a locally selected photo into object storage:
//!
//! 1. [`acquisition`] asks the platform picker for an [`ImageHandle`](casa_core::models::ImageHandle).
//! 2. [`materialize`] turns the handle into bytes through an ordered chain of
//!    strategies chosen by runtime platform.
//! 3. [`pipeline`] validates the payload, generates a collision-resistant
//!    object path, uploads once and derives the public URL.

pub mod acquisition;
pub mod error;
pub mod materialize;
pub mod pipeline;
pub mod validator;

pub use acquisition::{
    acquire_image, FilePicker, MediaPicker, PermissionStatus, PickOutcome, PickerConfig,
    PickerError,
};
pub use error::UploadError;
pub use materialize::{
    HttpFetcher, MaterializationChain, MaterializeError, MaterializeStrategy, MediaFileSystem,
    StrategyError, TokioFileSystem, UriFetcher,
};
pub use pipeline::ImageUploader;
pub use validator::{PayloadValidator, ValidationError};
