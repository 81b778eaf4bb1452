//! Market Data Errors

use thiserror::Error;

/// Errors returned by market data lookups and typed-input parsing.
///
/// Sequence-producing operations never return these; they degrade to an
/// empty result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketDataError {
    /// No market matches the given ticker or identifier.
    #[error("market not found: {0}")]
    NotFound(String),

    /// Order book depth outside the supported set.
    #[error("unsupported book depth {0} (expected 5, 10 or 20)")]
    InvalidDepth(usize),

    /// Unrecognized candle timeframe label.
    #[error("unsupported timeframe '{0}' (expected 1m, 5m, 1h or 1d)")]
    InvalidTimeframe(String),
}

impl MarketDataError {
    /// Whether this error means the market does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
