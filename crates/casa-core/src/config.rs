//! Configuration module
//!
//! Storage, image pipeline and push notification settings, read from the
//! environment (and an optional `.env` file).

use std::env;

use crate::constants::{
    DEFAULT_ACTIVE_USER_WINDOW_DAYS, DEFAULT_CACHE_CONTROL_SECS, DEFAULT_IMAGE_MAX_HEIGHT,
    DEFAULT_IMAGE_MAX_WIDTH, DEFAULT_IMAGE_QUALITY, DEFAULT_PUSH_GATEWAY_URL,
    PUSH_GATEWAY_BATCH_LIMIT,
};
use crate::models::TransformOptions;
use crate::storage_types::StorageBackend;

const MAX_UPLOAD_SIZE_MB: u64 = 50;
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Session JWT of the signed-in user. Requests fall back to the anon key.
    pub supabase_access_token: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub cache_control_secs: u64,
    pub http_timeout_secs: u64,
    // Image pipeline configuration
    pub max_upload_bytes: u64,
    pub image_max_width: u32,
    pub image_max_height: u32,
    pub image_quality: f32,
    // Push notification configuration
    pub push_gateway_url: String,
    pub push_access_token: Option<String>,
    pub push_batch_size: usize,
    pub active_user_window_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Supabase,
            supabase_url: None,
            supabase_anon_key: None,
            supabase_access_token: None,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            cache_control_secs: DEFAULT_CACHE_CONTROL_SECS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            max_upload_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            image_max_width: DEFAULT_IMAGE_MAX_WIDTH,
            image_max_height: DEFAULT_IMAGE_MAX_HEIGHT,
            image_quality: DEFAULT_IMAGE_QUALITY,
            push_gateway_url: DEFAULT_PUSH_GATEWAY_URL.to_string(),
            push_access_token: None,
            push_batch_size: PUSH_GATEWAY_BATCH_LIMIT,
            active_user_window_days: DEFAULT_ACTIVE_USER_WINDOW_DAYS,
        }
    }
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    /// Resize bounds and quality from `IMAGE_MAX_WIDTH`, `IMAGE_MAX_HEIGHT` and `IMAGE_QUALITY`.
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            max_width: self.image_max_width,
            max_height: self.image_max_height,
            quality: self.image_quality,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Supabase,
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = Config {
            environment,
            storage_backend,
            supabase_url: env::var("SUPABASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").ok().filter(|s| !s.is_empty()),
            supabase_access_token: env::var("SUPABASE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            cache_control_secs: env::var("CACHE_CONTROL_SECS")
                .unwrap_or_else(|_| DEFAULT_CACHE_CONTROL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_CACHE_CONTROL_SECS),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
            max_upload_bytes: max_upload_size_mb * 1024 * 1024,
            image_max_width: env::var("IMAGE_MAX_WIDTH")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MAX_WIDTH.to_string())
                .parse()
                .unwrap_or(DEFAULT_IMAGE_MAX_WIDTH),
            image_max_height: env::var("IMAGE_MAX_HEIGHT")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MAX_HEIGHT.to_string())
                .parse()
                .unwrap_or(DEFAULT_IMAGE_MAX_HEIGHT),
            image_quality: env::var("IMAGE_QUALITY")
                .unwrap_or_else(|_| DEFAULT_IMAGE_QUALITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_IMAGE_QUALITY),
            push_gateway_url: env::var("PUSH_GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_PUSH_GATEWAY_URL.to_string()),
            push_access_token: env::var("PUSH_ACCESS_TOKEN").ok().filter(|s| !s.is_empty()),
            push_batch_size: env::var("PUSH_BATCH_SIZE")
                .unwrap_or_else(|_| PUSH_GATEWAY_BATCH_LIMIT.to_string())
                .parse()
                .unwrap_or(PUSH_GATEWAY_BATCH_LIMIT),
            active_user_window_days: env::var("ACTIVE_USER_WINDOW_DAYS")
                .unwrap_or_else(|_| DEFAULT_ACTIVE_USER_WINDOW_DAYS.to_string())
                .parse()
                .unwrap_or(DEFAULT_ACTIVE_USER_WINDOW_DAYS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than zero"));
        }

        self.transform_options().validate().map_err(|e| {
            anyhow::anyhow!("IMAGE_MAX_WIDTH, IMAGE_MAX_HEIGHT or IMAGE_QUALITY: {}", e)
        })?;

        if self.is_production() && self.storage_backend == StorageBackend::Local {
            return Err(anyhow::anyhow!(
                "The local storage backend cannot be used in production"
            ));
        }

        if self.push_batch_size == 0 || self.push_batch_size > PUSH_GATEWAY_BATCH_LIMIT {
            return Err(anyhow::anyhow!(
                "PUSH_BATCH_SIZE must be between 1 and {}",
                PUSH_GATEWAY_BATCH_LIMIT
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::Supabase => {
                if self.supabase_url.is_none() || self.supabase_anon_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL and SUPABASE_ANON_KEY must be set when using Supabase storage backend"
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Bearer token for backend requests: the user session if present, else the anon key.
    pub fn supabase_bearer(&self) -> Option<&str> {
        self.supabase_access_token
            .as_deref()
            .or(self.supabase_anon_key.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supabase_config() -> Config {
        Config {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_ceiling_is_fifty_megabytes() {
        assert_eq!(Config::default().max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_validate_supabase_requires_credentials() {
        assert!(Config::default().validate().is_err());
        assert!(supabase_config().validate().is_ok());
    }

    #[test]
    fn test_validate_local_requires_path_and_url() {
        let mut config = Config {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/casa".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.local_storage_base_url = Some("http://localhost:8080/media".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_batch_size_limit() {
        let mut config = supabase_config();
        config.push_batch_size = 101;
        assert!(config.validate().is_err());
        config.push_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_quality_range() {
        let mut config = supabase_config();
        config.image_quality = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bearer_prefers_session_token() {
        let mut config = supabase_config();
        assert_eq!(config.supabase_bearer(), Some("anon"));
        config.supabase_access_token = Some("user-jwt".to_string());
        assert_eq!(config.supabase_bearer(), Some("user-jwt"));
    }

    #[test]
    fn test_is_production() {
        let mut config = Config::default();
        assert!(!config.is_production());
        config.environment = "Prod".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_validate_rejects_local_backend_in_production() {
        let mut config = Config {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/casa".to_string()),
            local_storage_base_url: Some("http://localhost:8080/media".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_image_bounds() {
        let mut config = supabase_config();
        config.image_max_width = 0;
        assert!(config.validate().is_err());
    }
}
