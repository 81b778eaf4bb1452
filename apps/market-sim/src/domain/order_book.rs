//! Depth-of-Book Generation
//!
//! Builds bid and ask ladders around a quote. Price rungs are pinned to the
//! quote one tick (0.01) apart; sizes come from a freshly time-seeded source
//! so consecutive polls show churning liquidity.
//!
//! Bids are emitted in descending price order (best bid first).
//! Asks are emitted in ascending price order (best ask first).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::MarketDataError;
use super::market::MarketId;
use super::quote::Quote;
use super::random::{SeededRandom, floor_to_u64};

/// Price distance between adjacent rungs.
pub const TICK_SIZE: f64 = 0.01;

/// Side of the book a level rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    /// Resting buy interest.
    Bid,
    /// Resting sell interest.
    Ask,
}

/// A single price rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// Price of this rung.
    pub price: f64,
    /// Contracts resting at this rung.
    pub size: u64,
    /// Running size from the best price outward, inclusive.
    pub cumulative: u64,
    /// Side of the book.
    pub side: BookSide,
}

// =============================================================================
// Depth
// =============================================================================

/// Supported ladder depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum BookDepth {
    /// Five levels per side.
    Five,
    /// Ten levels per side.
    #[default]
    Ten,
    /// Twenty levels per side.
    Twenty,
}

impl BookDepth {
    /// Number of levels per side.
    #[must_use]
    pub const fn levels(self) -> usize {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
        }
    }
}

impl TryFrom<usize> for BookDepth {
    type Error = MarketDataError;

    fn try_from(levels: usize) -> Result<Self, Self::Error> {
        match levels {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            20 => Ok(Self::Twenty),
            other => Err(MarketDataError::InvalidDepth(other)),
        }
    }
}

impl From<BookDepth> for usize {
    fn from(depth: BookDepth) -> Self {
        depth.levels()
    }
}

impl fmt::Display for BookDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.levels())
    }
}

// =============================================================================
// Order Book
// =============================================================================

/// Bid and ask ladders for a market at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    /// Market identifier.
    pub market_id: MarketId,
    /// Bid levels, best (highest) first.
    pub bids: Vec<DepthLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<DepthLevel>,
    /// Generation time (Unix millis).
    pub timestamp: i64,
}

impl OrderBook {
    /// Best bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Distance between best ask and best bid.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// Average of best bid and best ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_ask()? + self.best_bid()?) / 2.0)
    }

    /// Total resting size on one side.
    #[must_use]
    pub fn total_size(&self, side: BookSide) -> u64 {
        let levels = match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        };
        levels.last().map_or(0, |l| l.cumulative)
    }

    /// Check ladder integrity: strictly monotonic prices per side, running
    /// cumulative sizes, and an uncrossed top of book.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let bids_descending = self.bids.windows(2).all(|w| w[0].price > w[1].price);
        let asks_ascending = self.asks.windows(2).all(|w| w[0].price < w[1].price);
        let uncrossed = match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask > bid,
            _ => true,
        };

        bids_descending
            && asks_ascending
            && uncrossed
            && has_running_totals(&self.bids, BookSide::Bid)
            && has_running_totals(&self.asks, BookSide::Ask)
    }
}

fn has_running_totals(levels: &[DepthLevel], side: BookSide) -> bool {
    let mut running = 0u64;
    levels.iter().all(|level| {
        running += level.size;
        level.side == side && level.size > 0 && level.cumulative == running
    })
}

// =============================================================================
// Generator
// =============================================================================

/// Stateless order book generator.
pub struct OrderBookGenerator;

impl OrderBookGenerator {
    /// Source for one generation call: the third identifier character plus
    /// the current time, so repeated polls differ.
    #[must_use]
    pub fn source_for(market_id: &MarketId, now_millis: i64) -> SeededRandom {
        let salt = market_id.as_str().chars().nth(2).map_or(0, u32::from);
        SeededRandom::from_millis(now_millis.wrapping_add(i64::from(salt)))
    }

    /// Generate a book around `quote` using `rng` for level sizes.
    #[must_use]
    pub fn generate(
        quote: &Quote,
        depth: BookDepth,
        rng: &mut SeededRandom,
        timestamp: i64,
    ) -> OrderBook {
        let levels = depth.levels();
        let mut bids = Vec::with_capacity(levels);
        let mut asks = Vec::with_capacity(levels);
        let mut cumulative_bid = 0u64;
        let mut cumulative_ask = 0u64;

        for i in 0..levels {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f64 * TICK_SIZE;

            let bid_size = random_size(rng);
            cumulative_bid += bid_size;
            bids.push(DepthLevel {
                price: quote.bid - offset,
                size: bid_size,
                cumulative: cumulative_bid,
                side: BookSide::Bid,
            });

            let ask_size = random_size(rng);
            cumulative_ask += ask_size;
            asks.push(DepthLevel {
                price: quote.ask + offset,
                size: ask_size,
                cumulative: cumulative_ask,
                side: BookSide::Ask,
            });
        }

        OrderBook {
            market_id: quote.market_id.clone(),
            bids,
            asks,
            timestamp,
        }
    }
}

fn random_size(rng: &mut SeededRandom) -> u64 {
    floor_to_u64(rng.range(500.0, 2_500.0))
}

// =============================================================================
// Tests
// =============================================================================
