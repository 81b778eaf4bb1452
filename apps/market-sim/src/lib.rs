#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Market Sim - Synthetic Prediction-Market Data Engine
//!
//! Derives quotes, order books, historical candles and a live trade tape
//! for a fixed catalog of binary prediction markets, using nothing but a
//! market identifier and a seeded pseudorandom source.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Market records and pure generators
//!   - `random`: Seeded linear congruential source
//!   - `catalog`: Market catalog built from templates
//!   - `quote`, `order_book`, `candles`, `trade`: Generated views
//!   - `subscription`: Live trade subscription bookkeeping
//!
//! - **Application**: Services and port definitions
//!   - `ports`: Clock and trade sink interfaces
//!   - `services`: Trade streaming and the `MarketDataService` facade
//!
//! - **Infrastructure**: Process-level adapters
//!   - `config`: Environment configuration
//!   - `telemetry`: Tracing subscriber and OTLP export
//!   - `metrics`: Prometheus instrumentation
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//!                       ┌──► OrderBookGenerator (time-seeded sizes)
//! Catalog ──► Quote ────┼──► CandleGenerator    (id + timeframe seed)
//!  (id seed)            └──► TradeStreamManager ──► TradeSink 1..N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Market records and synthetic data generators.
pub mod domain;

/// Application layer - Services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::candles::{CandleGenerator, CandleWalk, MAX_CANDLE_COUNT, OhlcBar, Timeframe};
pub use domain::catalog::{CatalogError, MarketCatalog, MarketTemplate, STANDARD_TEMPLATES};
pub use domain::error::MarketDataError;
pub use domain::market::{Category, Market, MarketId, MarketStatus};
pub use domain::order_book::{BookDepth, BookSide, DepthLevel, OrderBook, OrderBookGenerator};
pub use domain::quote::{Quote, QuoteGenerator};
pub use domain::random::SeededRandom;
pub use domain::subscription::{SubscriptionId, SubscriptionRegistry, SubscriptionStats};
pub use domain::trade::{Trade, TradeId, TradeSide};

// Ports and services
pub use application::ports::{Clock, FixedClock, NoOpTradeSink, SystemClock, TradeSink};
pub use application::services::{
    DEFAULT_CANDLE_COUNT, DEFAULT_RANK_LIMIT, MarketDataService, MarketSnapshot, RankMetric,
    SubscriptionState, TradeStream, TradeStreamConfig, TradeStreamManager, TradeSubscription,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, FeedSettings, ServerSettings, SimConfig, TradeStreamSettings,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
