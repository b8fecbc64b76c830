//! Casa CLI: drives the image upload pipeline and push broadcasts.
//!
//! Configuration comes from the environment (and `.env`); see `casa_core::Config`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use casa_cli::{describe_error, init_tracing, parse_audience, report_error, upload_options};
use casa_core::models::{Notice, Platform};
use casa_core::Config;
use casa_media::{FilePicker, ImageUploader};
use casa_notify::{BroadcastService, ExpoPushGateway, RestRepository};
use casa_storage::create_storage;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "casa", about = "Casa storefront media and notification tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image file to a bucket
    Upload {
        /// Path to the image
        file: PathBuf,
        /// Destination bucket
        #[arg(long, default_value = casa_core::constants::PRODUCTS_BUCKET)]
        bucket: String,
        /// Folder inside the bucket
        #[arg(long, default_value = "images")]
        folder: String,
        /// Strategy chain to use: web, ios, android or desktop
        #[arg(long)]
        platform: Option<Platform>,
        /// Resize bound in pixels
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        /// JPEG quality in 0.0..=1.0
        #[arg(long)]
        quality: Option<f32>,
    },
    /// Remove a previously uploaded image by its public URL
    Remove {
        #[arg(long)]
        bucket: String,
        public_url: String,
    },
    /// Send a notification to registered devices
    Broadcast {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Extra JSON payload delivered with the notification
        #[arg(long)]
        data: Option<String>,
        /// all or active
        #[arg(long, default_value = "all")]
        audience: String,
        /// Activity window for the active audience (defaults to ACTIVE_USER_WINDOW_DAYS)
        #[arg(long)]
        days: Option<u32>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn uploader(config: &Config, platform: Platform) -> anyhow::Result<ImageUploader> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    ImageUploader::from_config(config, storage, platform).map_err(|e| {
        report_error(&e);
        anyhow::anyhow!(describe_error(&e))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    tracing::debug!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Upload {
            file,
            bucket,
            folder,
            platform,
            max_width,
            max_height,
            quality,
        } => {
            let platform = platform.unwrap_or_else(Platform::current);
            let options =
                upload_options(&config, bucket, folder, max_width, max_height, quality)?;

            let uploader = uploader(&config, platform)
                .await?
                .with_picker(Arc::new(FilePicker::new(Some(file))));

            match uploader.pick_and_upload_image(&options).await {
                Ok(Some(result)) => print_json(&result)?,
                Ok(None) => print_json(&serde_json::json!({ "cancelled": true }))?,
                Err(e) => {
                    report_error(&e);
                    anyhow::bail!(describe_error(&e));
                }
            }
        }
        Commands::Remove { bucket, public_url } => {
            let uploader = uploader(&config, Platform::current()).await?;
            uploader.remove_image(&bucket, &public_url).await;
            print_json(&serde_json::json!({ "removed": public_url }))?;
        }
        Commands::Broadcast {
            title,
            body,
            data,
            audience,
            days,
        } => {
            let audience =
                parse_audience(&audience, days.unwrap_or(config.active_user_window_days))?;
            let data = data
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .context("--data must be valid JSON")?;

            let repository = Arc::new(
                RestRepository::from_config(&config).context("Failed to create table client")?,
            );
            let gateway = ExpoPushGateway::new(
                config.push_gateway_url.clone(),
                config.push_access_token.clone(),
                Duration::from_secs(config.http_timeout_secs),
            )
            .context("Failed to create push gateway client")?;
            let service = BroadcastService::new(repository.clone(), repository, Arc::new(gateway))
                .with_batch_size(config.push_batch_size);

            let notice = Notice { title, body, data };
            match service.broadcast(&notice, audience).await {
                Ok(report) => print_json(&report)?,
                Err(e) => {
                    report_error(&e);
                    anyhow::bail!(describe_error(&e));
                }
            }
        }
    }

    Ok(())
}
