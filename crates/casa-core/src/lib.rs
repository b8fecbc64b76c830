//! Casa Core Library
//!
//! This crate provides the domain models, error metadata and configuration
//! shared by the storefront's media pipeline, storage backends and
//! notification fan-out.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
