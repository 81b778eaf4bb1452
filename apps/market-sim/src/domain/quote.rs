//! Quote Generation
//!
//! Derives a top-of-book snapshot for a market. The seed comes from the
//! market identifier alone, so every call for the same market yields the
//! same prices and sizes; only the timestamp changes.

use serde::{Deserialize, Serialize};

use super::market::{Market, MarketId};
use super::random::{SeededRandom, floor_to_u64, stable_seed};

/// Top-of-book snapshot for a market.
///
/// All prices are probabilities in `[0.01, 0.99]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Market identifier.
    pub market_id: MarketId,
    /// Market ticker.
    pub ticker: String,
    /// Last traded price.
    pub last: f64,
    /// Best bid.
    pub bid: f64,
    /// Best ask.
    pub ask: f64,
    /// `ask - bid`.
    pub spread: f64,
    /// Contracts traded over 24h.
    pub volume: u64,
    /// Open contracts.
    pub open_interest: u64,
    /// Absolute 24h price change.
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    /// 24h change relative to `last`, in percent.
    #[serde(rename = "changePercent24h")]
    pub change_percent_24h: f64,
    /// 24h high.
    #[serde(rename = "high24h")]
    pub high_24h: f64,
    /// 24h low.
    #[serde(rename = "low24h")]
    pub low_24h: f64,
    /// Generation time (Unix millis).
    pub timestamp: i64,
}

impl Quote {
    /// Mid price.
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// Stateless quote generator.
pub struct QuoteGenerator;

impl QuoteGenerator {
    /// Seed used for a market's quote.
    #[must_use]
    pub fn seed_for(market_id: &MarketId) -> u32 {
        stable_seed(market_id.as_str())
    }

    /// Generate the quote for `market`, stamped with `timestamp`.
    #[must_use]
    pub fn generate(market: &Market, timestamp: i64) -> Quote {
        let mut rng = SeededRandom::new(Self::seed_for(&market.id));

        let last = rng.range(0.30, 0.70);
        let spread = rng.range(0.01, 0.04);
        let bid = last - spread / 2.0;
        let ask = last + spread / 2.0;
        let volume = floor_to_u64(rng.range(10_000.0, 60_000.0));
        let open_interest = floor_to_u64(rng.range(50_000.0, 250_000.0));
        let change_24h = (rng.next_f64() - 0.5) * 0.10;
        let half_range = change_24h.abs() * 0.5;

        Quote {
            market_id: market.id.clone(),
            ticker: market.ticker.clone(),
            last,
            bid,
            ask,
            spread,
            volume,
            open_interest,
            change_24h,
            change_percent_24h: change_24h / last * 100.0,
            high_24h: last + half_range,
            low_24h: last - half_range,
            timestamp,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
