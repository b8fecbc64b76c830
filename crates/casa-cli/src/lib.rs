use anyhow::Context;
use casa_core::models::{Audience, ImageUploadOptions};
use casa_core::{Config, ErrorMetadata, LogLevel};

/// Initialize tracing for CLI binaries.
///
/// `RUST_LOG` selects the filter (default `info`); `LOG_FORMAT=json` switches
/// to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logs(std::env::var("LOG_FORMAT").ok().as_deref()) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn json_logs(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("json"))
}

/// Build the broadcast audience from the `--audience` and `--days` flags.
pub fn parse_audience(kind: &str, days: u32) -> anyhow::Result<Audience> {
    match kind.to_lowercase().as_str() {
        "all" => Ok(Audience::All),
        "active" | "recent" => {
            if days == 0 {
                anyhow::bail!("--days must be greater than zero");
            }
            Ok(Audience::RecentlyActive { within_days: days })
        }
        other => anyhow::bail!("Unknown audience '{}' (expected all or active)", other),
    }
}

/// Upload options from the command-line flags, falling back to `config`.
///
/// Flags go through the same bounds check as the environment values.
pub fn upload_options(
    config: &Config,
    bucket: String,
    folder: String,
    max_width: Option<u32>,
    max_height: Option<u32>,
    quality: Option<f32>,
) -> anyhow::Result<ImageUploadOptions> {
    let options = ImageUploadOptions {
        bucket,
        folder,
        max_width: max_width.unwrap_or(config.image_max_width),
        max_height: max_height.unwrap_or(config.image_max_height),
        quality: quality.unwrap_or(config.image_quality),
        ..ImageUploadOptions::default()
    };
    options
        .transform()
        .validate()
        .context("Invalid --max-width, --max-height or --quality")?;
    Ok(options)
}

/// One-line, user-facing rendering of a classified error.
pub fn describe_error<E: ErrorMetadata>(err: &E) -> String {
    match err.suggested_action() {
        Some(action) => format!("[{}] {} {}", err.error_code(), err.client_message(), action),
        None => format!("[{}] {}", err.error_code(), err.client_message()),
    }
}

/// Log a classified error at its own level before handing it to `anyhow`.
pub fn report_error<E: ErrorMetadata + std::error::Error>(err: &E) {
    let details = casa_core::error::detailed_message(err);
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(code = err.error_code(), "{}", details),
        LogLevel::Warn => tracing::warn!(code = err.error_code(), "{}", details),
        LogLevel::Error => tracing::error!(code = err.error_code(), "{}", details),
    }
}
