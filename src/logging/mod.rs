// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingSettings};

/// Initialize the tracing subscriber
///
/// The filter honours `RUST_LOG` and falls back to `settings.level`.
/// Output goes to stderr so that CLI output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
///
/// # Examples
///
/// ```
/// use cloudinary_sdk::config::LoggingSettings;
/// use cloudinary_sdk::logging::init_subscriber;
///
/// init_subscriber(&LoggingSettings::default()).ok();
/// tracing::info!("SDK ready");
/// ```
pub fn init_subscriber(settings: &LoggingSettings) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    let registry = Registry::default().with(filter);
    match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
