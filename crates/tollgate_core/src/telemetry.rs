//! Tracing subscriber initialization.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a human-readable tracing subscriber.
///
/// Respects the `RUST_LOG` environment variable and defaults to `info`.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Install a JSON tracing subscriber for log aggregation.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing_json() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
