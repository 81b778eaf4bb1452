//! Simulated Trade Ticks

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::market::MarketId;
use super::quote::Quote;
use super::random::{SeededRandom, clamp_price, floor_to_u64};

/// Maximum price improvement through the touch.
const MAX_SLIPPAGE: f64 = 0.01;

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Buyer lifted the offer.
    Buy,
    /// Seller hit the bid.
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// Unique trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single simulated execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unique identifier.
    pub id: TradeId,
    /// Market identifier.
    pub market_id: MarketId,
    /// Execution time (Unix millis).
    pub timestamp: i64,
    /// Aggressor side.
    pub side: TradeSide,
    /// Execution price.
    pub price: f64,
    /// Contracts traded.
    pub quantity: u64,
}

impl Trade {
    /// Simulate one execution against `quote`.
    ///
    /// Buys print at or above the ask, sells at or below the bid, never
    /// more than one tick through the touch.
    #[must_use]
    pub fn simulate(quote: &Quote, rng: &mut SeededRandom, timestamp: i64) -> Self {
        let side = if rng.next_f64() > 0.5 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        };

        let raw = match side {
            TradeSide::Buy => quote.ask + rng.next_f64() * MAX_SLIPPAGE,
            TradeSide::Sell => quote.bid - rng.next_f64() * MAX_SLIPPAGE,
        };

        Self {
            id: TradeId::generate(),
            market_id: quote.market_id.clone(),
            timestamp,
            side,
            price: clamp_price(raw),
            quantity: floor_to_u64(rng.range(10.0, 110.0)),
        }
    }
}
