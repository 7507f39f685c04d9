//! Pulse Dashboard API Server
//!
//! Serves the dashboard's news, market, humor and brief endpoints. Works with
//! no external services at all, degrading to built-in sample data.

use std::net::SocketAddr;

use pulse_api::{build_router, AppState};
use pulse_core::PulseConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pulse_api=debug")),
        )
        .init();

    info!("Starting Pulse Dashboard API");

    let config = PulseConfig::from_env()?;
    let port = config.server_port;

    let state = AppState::build(config).await?;
    if state.caps.is_demo() {
        info!("No store and LIVE_FEEDS off - serving sample data");
    }

    // Prune idle rate-limit windows and expired cache entries in the background
    let limiter = state.rate_limiter.clone();
    let cache = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.prune();
            let stats = limiter.stats();
            tracing::debug!("Rate limiter pruned: {:?}", stats);
            let evicted = cache.prune();
            tracing::debug!("Cache pruned: {} expired entries", evicted);
        }
    });

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
