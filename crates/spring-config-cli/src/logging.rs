//! Console logging for the `spring-config` command.
//!
//! Logs go to stderr so stdout only carries the resolved properties.
//! `RUST_LOG` takes precedence over the `--verbose` switch.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Initialize the global tracing subscriber
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=info,reqwest=info", level)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_filter(filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}
