//! Application-wide constants.

/// Payload ceiling applied when `MAX_UPLOAD_SIZE_MB` is not set.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Default bounding box for the in-process resize transform.
pub const DEFAULT_IMAGE_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_IMAGE_MAX_HEIGHT: u32 = 1200;

/// Default JPEG quality hint, in `0.0..=1.0`.
pub const DEFAULT_IMAGE_QUALITY: f32 = 0.8;

/// `Cache-Control: max-age` applied to uploaded objects.
pub const DEFAULT_CACHE_CONTROL_SECS: u64 = 3600;

/// Content type used when nothing better can be detected.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Extension used when the content type is not in the mapping table.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Maximum number of messages the push gateway accepts per request.
pub const PUSH_GATEWAY_BATCH_LIMIT: usize = 100;

pub const DEFAULT_PUSH_GATEWAY_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Window used by the "recently active" audience.
pub const DEFAULT_ACTIVE_USER_WINDOW_DAYS: u32 = 30;

/// Logical buckets used by the storefront.
pub const PRODUCTS_BUCKET: &str = "products";
pub const BANNERS_BUCKET: &str = "banners";
pub const CATEGORIES_BUCKET: &str = "categories";
