//! Trade Sink Port (Driven Port)
//!
//! Consumer side of a trade subscription.

use crate::domain::trade::Trade;

/// Port receiving simulated trades.
///
/// Any `Fn(Trade)` closure that is `Send + Sync + 'static` is a sink.
pub trait TradeSink: Send + Sync + 'static {
    /// Deliver one trade. Must not block.
    fn deliver(&self, trade: Trade);
}

impl<F> TradeSink for F
where
    F: Fn(Trade) + Send + Sync + 'static,
{
    fn deliver(&self, trade: Trade) {
        self(trade);
    }
}

/// Sink that discards every trade.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTradeSink;

impl TradeSink for NoOpTradeSink {
    fn deliver(&self, _trade: Trade) {}
}
