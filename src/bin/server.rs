//! Headless tick runner: the tick loop only, no admin HTTP surface. Mirrors
//! the teacher's `src/bin/server.rs` "push-based, JSON to stdout, no
//! incoming connections" deployment mode for environments that don't want
//! the admin API exposed at all (the agent is still controllable by editing
//! its persisted state directly, or by running `sentinel-agent` instead).
//!
//! # Metrics output
//! A status line is logged as JSON every `OBSERVABILITY_INTERVAL` seconds
//! (default 60), prefixed `METRICS_JSON:`, collectible by any log
//! aggregator that tails stdout.

use anyhow::{Context, Result};
use sentinel_agent::bootstrap;
use sentinel_agent::config::Config;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("sentinel-agent server {} starting (headless, no admin HTTP)", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("failed to load configuration")?;
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/agent.db".to_string());

    let runtime = bootstrap::build(config, &db_url).await?;
    let agent_for_metrics = runtime.agent.clone();

    let interval_secs: u64 = std::env::var("OBSERVABILITY_INTERVAL").ok().and_then(|v| v.parse().ok()).unwrap_or(60);

    let metrics = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let status = agent_for_metrics.status().await;
            match serde_json::to_string(&status) {
                Ok(json) => println!("METRICS_JSON:{json}"),
                Err(err) => tracing::warn!(%err, "failed to serialize status for metrics output"),
            }
        }
    });

    let tick_loop = tokio::spawn(async move {
        bootstrap::run_tick_loop(&runtime).await;
    });

    info!("server running, press Ctrl+C to shut down");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
        }
        _ = metrics => {
            tracing::warn!("metrics task ended unexpectedly");
        }
        _ = tick_loop => {
            tracing::warn!("tick loop task ended unexpectedly");
        }
    }

    Ok(())
}
