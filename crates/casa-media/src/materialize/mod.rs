//! Byte materialization: turn a platform image handle into uploadable bytes.
//!
//! Each platform gets an ordered list of [`MaterializeStrategy`]s. The
//! [`MaterializationChain`] tries them in order and returns the first payload
//! that passes the [`PayloadValidator`]; partial results are never combined.
//!
//! | Platform | Strategies |
//! |---|---|
//! | web | `direct_fetch` |
//! | ios, android, desktop | `resize_transform`, `raw_file_read`, `best_effort_fetch` |

mod fetch;
mod fs;
mod strategies;

pub use fetch::{FetchedBytes, HttpFetcher, UriFetcher};
pub use fs::{local_path, MediaFileSystem, TokioFileSystem};
pub use strategies::{
    candidate_uris, resize_to_jpeg, BestEffortFetch, DirectFetch, RawFileRead, ResizeTransform,
};

use crate::validator::{PayloadValidator, ValidationError};
use async_trait::async_trait;
use casa_core::constants::DEFAULT_IMAGE_CONTENT_TYPE;
use casa_core::models::{BytePayload, ImageHandle, Platform, TransformOptions};
use casa_storage::content_type_for_extension;
use std::sync::Arc;

/// Why a single strategy could not produce bytes.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("Source not available to this strategy: {0}")]
    Unavailable(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Image transform failed: {0}")]
    Transform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Terminal materialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error(
        "Could not read the selected image on {platform} (tried: {}). Pick a different image or restart the app.",
        .attempts.join(", ")
    )]
    Exhausted {
        platform: Platform,
        attempts: Vec<String>,
    },

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// One way of producing bytes from an image handle.
#[async_trait]
pub trait MaterializeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        handle: &ImageHandle,
        transform: &TransformOptions,
    ) -> Result<BytePayload, StrategyError>;
}

/// Resolve the content type of materialized bytes.
///
/// Order: transport header, declared MIME type, URI extension, magic bytes,
/// then `image/jpeg`.
pub fn resolve_content_type(header: Option<&str>, handle: &ImageHandle, data: &[u8]) -> String {
    let header = header
        .map(|h| h.split(';').next().unwrap_or(h).trim().to_lowercase())
        .filter(|h| h.starts_with("image/"));
    if let Some(header) = header {
        return header;
    }

    if let Some(mime) = handle.mime_type.as_deref().filter(|m| m.starts_with("image/")) {
        return mime.to_string();
    }

    if let Some(ct) = handle.extension().as_deref().and_then(content_type_for_extension) {
        return ct.to_string();
    }

    image::guess_format(data)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| DEFAULT_IMAGE_CONTENT_TYPE.to_string())
}

/// Ordered fallback chain of strategies for one platform.
#[derive(Clone)]
pub struct MaterializationChain {
    platform: Platform,
    strategies: Vec<Arc<dyn MaterializeStrategy>>,
    validator: PayloadValidator,
}

impl MaterializationChain {
    pub fn new(
        platform: Platform,
        strategies: Vec<Arc<dyn MaterializeStrategy>>,
        validator: PayloadValidator,
    ) -> Self {
        Self {
            platform,
            strategies,
            validator,
        }
    }

    /// Standard chain for `platform`.
    pub fn for_platform(
        platform: Platform,
        fetcher: Arc<dyn UriFetcher>,
        files: Arc<dyn MediaFileSystem>,
        validator: PayloadValidator,
    ) -> Self {
        let strategies: Vec<Arc<dyn MaterializeStrategy>> = if platform.is_web() {
            vec![Arc::new(DirectFetch::new(fetcher))]
        } else {
            vec![
                Arc::new(ResizeTransform::new(files.clone())),
                Arc::new(RawFileRead::new(files)),
                Arc::new(BestEffortFetch::new(fetcher)),
            ]
        };
        Self::new(platform, strategies, validator)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn validator(&self) -> &PayloadValidator {
        &self.validator
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order until one yields a valid payload.
    pub async fn materialize(
        &self,
        handle: &ImageHandle,
        transform: &TransformOptions,
    ) -> Result<BytePayload, MaterializeError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut oversized: Option<(u64, u64)> = None;

        for strategy in &self.strategies {
            attempts.push(strategy.name().to_string());
            let start = std::time::Instant::now();

            let result = match strategy.attempt(handle, transform).await {
                Ok(payload) => self
                    .validator
                    .validate(&payload)
                    .map(|_| payload)
                    .map_err(StrategyError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(payload) => {
                    tracing::info!(
                        platform = %self.platform,
                        strategy = strategy.name(),
                        size_bytes = payload.len(),
                        content_type = %payload.content_type,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Image bytes materialized"
                    );
                    return Ok(payload);
                }
                Err(e) => {
                    if let StrategyError::Invalid(ValidationError::TooLarge { size, max }) = &e {
                        oversized = Some((*size, *max));
                    }
                    tracing::warn!(
                        platform = %self.platform,
                        strategy = strategy.name(),
                        error = %e,
                        "Materialization strategy failed, trying next"
                    );
                }
            }
        }

        if let Some((size, max)) = oversized {
            return Err(MaterializeError::TooLarge { size, max });
        }

        tracing::error!(
            platform = %self.platform,
            uri = %handle.uri,
            attempts = ?attempts,
            "All materialization strategies failed"
        );
        Err(MaterializeError::Exhausted {
            platform: self.platform,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed {
        name: &'static str,
        bytes: Option<Vec<u8>>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl MaterializeStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(
            &self,
            _handle: &ImageHandle,
            _transform: &TransformOptions,
        ) -> Result<BytePayload, StrategyError> {
            self.log.lock().unwrap().push(self.name);
            match &self.bytes {
                Some(data) => Ok(BytePayload {
                    data: data.clone(),
                    content_type: "image/jpeg".to_string(),
                    width: None,
                    height: None,
                    strategy: self.name,
                }),
                None => Err(StrategyError::Unavailable(self.name.to_string())),
            }
        }
    }

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    fn chain(steps: Vec<(&'static str, Option<Vec<u8>>)>, max: u64) -> (MaterializationChain, CallLog) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let strategies = steps
            .into_iter()
            .map(|(name, bytes)| {
                Arc::new(Fixed {
                    name,
                    bytes,
                    log: log.clone(),
                }) as Arc<dyn MaterializeStrategy>
            })
            .collect();
        (
            MaterializationChain::new(Platform::Android, strategies, PayloadValidator::new(max)),
            log,
        )
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (chain, log) = chain(
            vec![("a", None), ("b", Some(vec![1, 2, 3])), ("c", Some(vec![9]))],
            100,
        );
        let payload = chain
            .materialize(&ImageHandle::new("file:///x.jpg"), &TransformOptions::default())
            .await
            .unwrap();
        assert_eq!(payload.strategy, "b");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_payload_falls_through() {
        let (chain, _) = chain(vec![("a", Some(vec![])), ("b", Some(vec![7]))], 100);
        let payload = chain
            .materialize(&ImageHandle::new("file:///x.jpg"), &TransformOptions::default())
            .await
            .unwrap();
        assert_eq!(payload.strategy, "b");
    }

    #[tokio::test]
    async fn test_exhausted_names_platform_and_attempts() {
        let (chain, _) = chain(vec![("a", None), ("b", Some(vec![]))], 100);
        let err = chain
            .materialize(&ImageHandle::new("file:///x.jpg"), &TransformOptions::default())
            .await
            .unwrap_err();
        match &err {
            MaterializeError::Exhausted { platform, attempts } => {
                assert_eq!(*platform, Platform::Android);
                assert_eq!(attempts, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("android"));
        assert!(message.contains("restart the app"));
    }

    #[tokio::test]
    async fn test_oversized_attempt_is_terminal_size_error() {
        let (chain, _) = chain(vec![("a", Some(vec![0; 20])), ("b", None)], 10);
        let err = chain
            .materialize(&ImageHandle::new("file:///x.jpg"), &TransformOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MaterializeError::TooLarge { size: 20, max: 10 }));
    }

    #[test]
    fn test_platform_strategy_order() {
        let fetcher: Arc<dyn UriFetcher> =
            Arc::new(HttpFetcher::new(std::time::Duration::from_secs(5)).unwrap());
        let files: Arc<dyn MediaFileSystem> = Arc::new(TokioFileSystem);
        let validator = PayloadValidator::new(100);

        let web = MaterializationChain::for_platform(
            Platform::Web,
            fetcher.clone(),
            files.clone(),
            validator,
        );
        assert_eq!(web.strategy_names(), vec!["direct_fetch"]);

        for platform in [Platform::Ios, Platform::Android, Platform::Desktop] {
            let native =
                MaterializationChain::for_platform(platform, fetcher.clone(), files.clone(), validator);
            assert_eq!(
                native.strategy_names(),
                vec!["resize_transform", "raw_file_read", "best_effort_fetch"]
            );
        }
    }

    #[test]
    fn test_resolve_content_type_order() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let mut handle = ImageHandle::new("https://cdn.example.com/a.webp");
        handle.mime_type = Some("image/gif".to_string());

        assert_eq!(
            resolve_content_type(Some("image/png; charset=binary"), &handle, &png_magic),
            "image/png"
        );
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), &handle, &png_magic),
            "image/gif"
        );
        handle.mime_type = None;
        assert_eq!(resolve_content_type(None, &handle, &png_magic), "image/webp");

        let bare = ImageHandle::new("content://media/external/images/42");
        assert_eq!(resolve_content_type(None, &bare, &png_magic), "image/png");
        assert_eq!(resolve_content_type(None, &bare, b"????"), "image/jpeg");
    }
}
