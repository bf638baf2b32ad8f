//! `upwatch` -- availability monitor daemon.
//!
//! Probes every configured target on its own schedule and announces
//! debounced up/down transitions to the configured sinks.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default     | Description                              |
//! |-----------------------|----------|-------------|------------------------------------------|
//! | `UPWATCH_CONFIG`      | no       | discovered  | Path to the YAML configuration file      |
//! | `UPWATCH_TICK_MILLIS` | no       | `1000`      | Real-time length of one tick             |
//! | `RUST_LOG`            | no       | `upwatch_agent=info,upwatch_events=info` | Log filter  |

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upwatch_agent::{Monitor, DEFAULT_TICK};
use upwatch_core::loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upwatch_agent=info,upwatch_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let tick = std::env::var("UPWATCH_TICK_MILLIS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TICK);

    let path = loader::discover().context("locating configuration")?;
    let config = loader::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    tracing::info!(
        config = %path.display(),
        units = config.units.len(),
        sinks = config.sinks.len(),
        "Starting upwatch",
    );

    let mut monitor = Monitor::from_config(&config, tick).context("building monitor")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, finishing current round");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    monitor.run(cancel).await;
    Ok(())
}
