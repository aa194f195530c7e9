//! Tracing and logging configuration
//!
//! Development gets pretty, human-readable output at DEBUG; production gets
//! flattened JSON at INFO for log aggregation. `RUST_LOG` overrides the
//! default filter in both (e.g. `RUST_LOG=debug,tower_http=trace`).

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Install the global subscriber for `env`. Fails if one is already set.
pub fn init_tracing(env: Environment) -> anyhow::Result<()> {
    if env.is_development() {
        init_development_tracing()
    } else {
        init_production_tracing()
    }
}

fn init_development_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .pretty()
                .with_filter(env_filter),
        )
        .try_init()?;

    tracing::info!("Tracing initialized in development mode");
    Ok(())
}

fn init_production_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .with_filter(env_filter),
        )
        .try_init()?;

    tracing::info!("Tracing initialized in production mode");
    Ok(())
}
