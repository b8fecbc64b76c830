//! Casa Storage Library
//!
//! This crate provides the object storage abstraction used by the image
//! pipeline, plus backends for the hosted storage REST API, S3 and the local
//! filesystem.
//!
//! # Object path format
//!
//! Objects live in a logical bucket (`products`, `banners`, ...) under a
//! generated path `{folder}/{unix-timestamp-ms}-{random-token}.{ext}`. Paths
//! must not contain `..` or a leading `/`. Path generation is centralized in
//! the `keys` module so every backend sees the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use casa_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{
    content_type_for_extension, extension_for_content_type, generate_object_path,
    object_path_from_public_url,
};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{ObjectOptions, Storage, StorageError, StorageResult};
