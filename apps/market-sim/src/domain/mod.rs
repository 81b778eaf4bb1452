//! Domain Layer - Market records and synthetic data generators.
//!
//! This layer contains the market data model and the pure generators that
//! derive quotes, books, candles and trades from a market identifier and a
//! seeded random source. Nothing here performs I/O or reads the clock.

/// Lowest representable price (probability).
pub const PRICE_FLOOR: f64 = 0.01;

/// Highest representable price (probability).
pub const PRICE_CEILING: f64 = 0.99;

/// OHLC bars and the candle random walk.
pub mod candles;

/// Market catalog built from templates.
pub mod catalog;

/// Lookup and parsing errors.
pub mod error;

/// Market identifiers, categories and records.
pub mod market;

/// Depth-of-book generation.
pub mod order_book;

/// Top-of-book quote generation.
pub mod quote;

/// Seeded pseudorandom source.
pub mod random;

/// Live trade subscription bookkeeping.
pub mod subscription;

/// Simulated trade ticks.
pub mod trade;
