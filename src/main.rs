use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use cloudinary_sdk::config::SdkConfig;
use cloudinary_sdk::logging::init_subscriber;
use cloudinary_sdk::network::{Progress, ProgressHandler, RequestParam, RequestParams, UploadPayload};
use cloudinary_sdk::signature::{api_sign_request, SignatureAlgorithm};
use cloudinary_sdk::transformation::Transformation;
use cloudinary_sdk::uploader::UploadParams;
use cloudinary_sdk::url::{DeliveryType, ResourceType};
use cloudinary_sdk::Cloudinary;

/// Cloudinary command line client
#[derive(Parser, Debug)]
#[command(name = "cloudinary-sdk")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file; defaults to CLOUDINARY_URL
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the delivery URL of an asset
    Url {
        public_id: String,
        /// Sign the URL with the API secret
        #[arg(long)]
        sign: bool,
        /// Raw transformation, e.g. "c_fill,w_100"
        #[arg(short, long)]
        transformation: Option<String>,
        #[arg(long, default_value = "image")]
        resource_type: ResourceType,
        #[arg(long = "type", default_value = "upload")]
        delivery_type: DeliveryType,
        #[arg(short, long)]
        format: Option<String>,
        /// Asset version, rendered as `v{version}`
        #[arg(long = "asset-version")]
        version: Option<String>,
    },
    /// Print the API signature of key=value parameters
    Sign {
        #[arg(required = true)]
        params: Vec<String>,
    },
    /// Fetch an image through the image cache and print its size
    Fetch { url: String },
    /// Upload a local file or remote URL and print the result as JSON
    Upload {
        source: String,
        #[arg(long)]
        public_id: Option<String>,
        #[arg(long)]
        folder: Option<String>,
        /// Upload unsigned with this preset
        #[arg(long)]
        preset: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SdkConfig> {
    match path {
        Some(path) => SdkConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => SdkConfig::from_env().context("Failed to load configuration from CLOUDINARY_URL"),
    }
}

fn parse_params(pairs: &[String]) -> Result<RequestParams> {
    let mut params = RequestParams::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{}'", pair);
        };
        params.insert(key.to_string(), RequestParam::Text(value.to_string()));
    }
    Ok(params)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    if let Err(e) = init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    config.validate().context("Invalid configuration")?;
    tracing::info!(
        cloud_name = %config.cloud.cloud_name,
        cache = %config.cache.name,
        cache_policy = ?config.cache.policy,
        "Configuration loaded successfully"
    );
    if args.test {
        println!("Configuration OK");
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("No command given; see --help");
    };

    match command {
        Command::Url {
            public_id,
            sign,
            transformation,
            resource_type,
            delivery_type,
            format,
            version,
        } => {
            let client = Cloudinary::new(config.cloud.clone())?;
            let mut builder = client
                .create_url()
                .resource_type(resource_type)
                .delivery_type(delivery_type);
            if let Some(raw) = transformation {
                builder = builder.transformation(Transformation::new().raw_transformation(raw));
            }
            if let Some(format) = format {
                builder = builder.format(format);
            }
            if let Some(version) = version {
                builder = builder.version(version);
            }
            println!("{}", builder.generate(&public_id, sign)?);
        }
        Command::Sign { params } => {
            let Some(secret) = config.cloud.api_secret.as_deref() else {
                bail!("api_secret is required for signing");
            };
            let params = parse_params(&params)?;
            println!("{}", api_sign_request(&params, secret, SignatureAlgorithm::Sha1));
        }
        Command::Fetch { url } => {
            let client = Cloudinary::from_config(&config).await?;
            let image = client.downloader().fetch_image(&url, None).response().await?;
            println!("{}x{}", image.width(), image.height());
            if let Some(cache) = client.cache() {
                let stats = cache.stats().await;
                tracing::info!(
                    hits = stats.hits,
                    misses = stats.misses,
                    used_disk_bytes = stats.used_disk_bytes,
                    "Image cache statistics"
                );
            }
        }
        Command::Upload {
            source,
            public_id,
            folder,
            preset,
        } => {
            let client = Cloudinary::from_config(&config).await?;
            let mut params = UploadParams::new();
            if let Some(public_id) = public_id {
                params = params.public_id(public_id);
            }
            if let Some(folder) = folder {
                params = params.folder(folder);
            }
            let signed = preset.is_none();
            if let Some(preset) = preset {
                params = params.upload_preset(preset);
            }

            let progress: ProgressHandler = Arc::new(|p: Progress| {
                tracing::debug!(
                    total_bytes = p.total_bytes,
                    total_bytes_expected = ?p.total_bytes_expected,
                    "Upload progress"
                );
            });
            let result = client
                .uploader()
                .upload(UploadPayload::from_source(&source), params, signed, Some(progress))
                .response()
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
