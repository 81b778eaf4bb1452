//! Market Sim Binary
//!
//! Runs the synthetic market data engine with its health endpoint and logs
//! a live trade tape for the configured markets.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-sim
//! ```
//!
//! # Environment Variables
//!
//! - `MARKET_SIM_HEALTH_PORT`: Health check / metrics HTTP port (default: 8083)
//! - `MARKET_SIM_TRADE_MIN_DELAY_MS`: Shortest wait between trades (default: 500)
//! - `MARKET_SIM_TRADE_MAX_DELAY_MS`: Longest wait between trades (default: 2000)
//! - `MARKET_SIM_FEED_TICKERS`: Comma-separated tickers to stream (default: CPI,BTC100K)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: market-sim)
//! - `RUST_LOG`: Log level (default: info)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use market_sim::infrastructure::config::load_dotenv_from;
use market_sim::infrastructure::health::{HealthServer, HealthServerState};
use market_sim::infrastructure::telemetry;
use market_sim::{
    MarketCatalog, MarketDataService, SimConfig, SystemClock, Trade, TradeSubscription,
    init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = load_dotenv();

    // Initialize telemetry (tracing + optional OTLP)
    let _telemetry_guard = telemetry::init();

    match dotenv {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    tracing::info!("Starting market simulator");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics()?;

    let config = SimConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let service = Arc::new(MarketDataService::new(
        Arc::new(MarketCatalog::standard()),
        Arc::new(SystemClock),
        config.trade_stream.clone().into(),
    ));

    let health_server = HealthServer::new(
        config.server.health_port,
        Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(&service),
        )),
        shutdown_token.clone(),
    );

    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    let feeds = start_feeds(&service, &config.feed.tickers);
    tracing::info!(feeds = feeds.len(), "Market simulator ready");

    let received = shutdown_signal().await;
    tracing::info!(
        signal = received,
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Shutting down"
    );

    shutdown_token.cancel();
    drop(feeds);
    service.shutdown();

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, health_handle)
        .await
        .is_err()
    {
        tracing::warn!("Health server did not stop before timeout");
    }

    tracing::info!("Market simulator stopped");
    Ok(())
}

/// Subscribe to each configured ticker and log its trades.
fn start_feeds(service: &MarketDataService, tickers: &[String]) -> Vec<TradeSubscription> {
    tickers
        .iter()
        .filter_map(|ticker| match service.find_market(ticker) {
            Ok(market) => {
                let label = market.ticker.clone();
                let subscription = service.subscribe_trades(market.id.as_str(), move |trade: Trade| {
                    tracing::info!(
                        ticker = %label,
                        market = %trade.market_id,
                        side = %trade.side,
                        price = trade.price,
                        quantity = trade.quantity,
                        "Trade"
                    );
                });
                tracing::info!(ticker = %market.ticker, market = %market.id, "Feed started");
                Some(subscription)
            }
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "Skipping feed");
                None
            }
        })
        .collect()
}

/// Load the nearest `.env` file from the working directory upward.
fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match std::env::current_dir() {
        Ok(cwd) => load_dotenv_from(&cwd),
        Err(_) => Ok(None),
    }
}

/// Log the parsed configuration.
fn log_config(config: &SimConfig) {
    tracing::info!(
        health_port = config.server.health_port,
        min_delay = ?config.trade_stream.min_delay,
        max_delay = ?config.trade_stream.max_delay,
        feeds = ?config.feed.tickers,
        "Configuration loaded"
    );
}

/// Resolve once SIGINT or SIGTERM arrives, naming the signal.
#[allow(clippy::expect_used)]
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("SIGINT handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
