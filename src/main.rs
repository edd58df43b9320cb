// =============================================================================
// StockScope — Main Entry Point
// =============================================================================
//
// Loads the runtime config, wires the Yahoo price provider into the shared
// state and serves the REST API until Ctrl+C, then persists the config.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stockscope::api;
use stockscope::app_state::AppState;
use stockscope::market_data::YahooClient;
use stockscope::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("StockScope starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides(|key| std::env::var(key).ok());

    info!(
        provider_url = %config.provider_url,
        lookback_years = config.lookback_years,
        forecast_horizon = ?config.forecast_horizon(),
        "Configuration resolved"
    );

    // ── 2. Provider & shared state ───────────────────────────────────────
    let provider = YahooClient::new(&config.provider_url, config.request_timeout())
        .context("failed to build price provider client")?;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(provider)));

    // ── 3. HTTP server ───────────────────────────────────────────────────
    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("HTTP server failed")?;

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("StockScope shut down complete.");
    Ok(())
}
