//! Data models for the storefront services
//!
//! Each sub-module represents a specific feature area.

mod image;
mod notification;
mod platform;

// Re-export all models for convenient imports
pub use image::*;
pub use notification::*;
pub use platform::*;
