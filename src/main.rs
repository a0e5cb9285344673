//! Sentinel agent — full process: tick loop plus the admin HTTP surface.
//! Grounded in the teacher's `src/bin/server.rs` headless entry point,
//! generalized from a push-metrics-to-stdout-only binary to one that also
//! serves spec §6's admin API, since this crate has no GUI binary to pair
//! it against (spec Non-goals exclude a UI).

use anyhow::{Context, Result};
use sentinel_agent::bootstrap;
use sentinel_agent::config::Config;
use sentinel_agent::interfaces::admin;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("sentinel-agent {} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("failed to load configuration")?;
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/agent.db".to_string());

    let runtime = bootstrap::build(config.clone(), &db_url).await?;

    let admin_addr: std::net::SocketAddr =
        format!("{}:{}", config.admin_bind_address, config.admin_port).parse().context("invalid admin bind address")?;
    let admin_router = admin::router(runtime.agent.clone(), config.admin_api_token.clone(), config.kill_switch_secret.clone());
    let listener = tokio::net::TcpListener::bind(admin_addr).await.context("failed to bind admin HTTP listener")?;
    info!(%admin_addr, "admin HTTP surface listening");

    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, admin_router).await {
            tracing::error!(%err, "admin HTTP server exited");
        }
    });

    let tick_loop = tokio::spawn(async move {
        bootstrap::run_tick_loop(&runtime).await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
        }
        _ = server => {
            tracing::warn!("admin server task ended unexpectedly");
        }
        _ = tick_loop => {
            tracing::warn!("tick loop task ended unexpectedly");
        }
    }

    Ok(())
}
