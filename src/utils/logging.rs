//! Tracing subscriber setup
//!
//! Filter precedence:
//! 1. `logging.verbose` -> debug level
//! 2. `RUST_LOG` environment variable
//! 3. `logging.level`

use crate::{Error, Result, config::LoggingSettings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter for the given settings
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    if settings.verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(&settings.level)
    }
}

/// Install the global tracing subscriber
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let json = settings.format.eq_ignore_ascii_case("json");

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter(settings))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| Error::config("logging", &format!("Failed to initialize tracing: {}", e)))
}
