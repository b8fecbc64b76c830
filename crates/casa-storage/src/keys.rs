//! Shared object path generation for storage backends.
//!
//! Path format: `{folder}/{unix-timestamp-ms}-{random-token}.{ext}`. The
//! timestamp plus a random token keeps concurrent uploads from the same or
//! different devices from colliding; the extension always matches the
//! content type that is sent with the object.

use casa_core::constants::DEFAULT_IMAGE_EXTENSION;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::traits::{StorageError, StorageResult};

const TOKEN_LEN: usize = 10;

/// Accepted image content types and their file extensions.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
];

fn normalize_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();
    if essence == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        essence
    }
}

/// File extension for a content type; unmapped types get the default extension.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let normalized = normalize_content_type(content_type);
    IMAGE_EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == normalized)
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

/// Content type for a file extension, if it is one of the accepted image types.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
    IMAGE_EXTENSIONS
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(ct, _)| *ct)
}

/// Generate a fresh object path inside `folder` for the given content type.
///
/// Every call produces a new path; callers retrying a failed upload must call
/// this again instead of reusing the failed path.
pub fn generate_object_path(folder: &str, content_type: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    let ext = extension_for_content_type(content_type);

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}-{}.{}", timestamp, token, ext)
    } else {
        format!("{}/{}-{}.{}", folder, timestamp, token, ext)
    }
}

/// Recover the object path from a public URL.
///
/// `url_prefix` is the backend's public URL for the bucket root, i.e.
/// `public_url(bucket, "")`. Only the text after that prefix is the path, so
/// a folder or physical bucket named like the logical bucket is not mistaken
/// for the bucket segment.
pub fn object_path_from_public_url(url_prefix: &str, public_url: &str) -> Option<String> {
    let without_query = public_url.split(['?', '#']).next()?;
    let path = without_query.strip_prefix(url_prefix)?;
    if path.is_empty() {
        return None;
    }

    urlencoding::decode(path).ok().map(|p| p.into_owned())
}

/// Reject paths that could escape the bucket.
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Object path contains invalid characters: {}",
            path
        )));
    }
    Ok(())
}
