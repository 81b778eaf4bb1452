//! Prometheus Metrics Module
//!
//! Exposes simulation metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Generation**: Quotes, order books and candle series produced
//! - **Trades**: Simulated trades emitted per market
//! - **Lookups**: Requests for unknown markets
//! - **Subscriptions**: Live trade subscription count
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before [`init_metrics`] is a no-op.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::market::MarketId;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "market_sim_generated_total",
        "Total market data views generated by operation"
    );
    describe_counter!(
        "market_sim_trades_emitted_total",
        "Total simulated trades delivered to subscribers"
    );
    describe_counter!(
        "market_sim_lookup_misses_total",
        "Total requests naming an unknown market"
    );
    describe_gauge!(
        "market_sim_trade_subscriptions",
        "Number of live trade subscriptions"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for service operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Market lookup by ticker or identifier.
    FindMarket,
    /// Quote generation.
    GetQuote,
    /// Order book generation.
    GetOrderBook,
    /// Candle series generation.
    GetCandles,
    /// Trade subscription.
    SubscribeTrades,
}

impl Operation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::FindMarket => "find_market",
            Self::GetQuote => "get_quote",
            Self::GetOrderBook => "get_order_book",
            Self::GetCandles => "get_candles",
            Self::SubscribeTrades => "subscribe_trades",
        }
    }
}

/// Record a generated view.
pub fn record_generated(operation: Operation) {
    counter!(
        "market_sim_generated_total",
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Record a trade delivered for `market`.
pub fn record_trade_emitted(market: &MarketId) {
    counter!(
        "market_sim_trades_emitted_total",
        "market" => market.to_string()
    )
    .increment(1);
}

/// Record a request naming an unknown market.
pub fn record_lookup_miss(operation: Operation) {
    counter!(
        "market_sim_lookup_misses_total",
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Update the live trade subscription count.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_subscriptions(count: usize) {
    gauge!("market_sim_trade_subscriptions").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
