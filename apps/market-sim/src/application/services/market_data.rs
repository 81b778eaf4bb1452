//! Market Data Service
//!
//! Facade over the catalog, the generators and the trade stream manager.
//! This is the only type external collaborators need; construct it once and
//! share it behind an `Arc`.
//!
//! Lookup operations (`find_market`, `get_quote`, `get_order_book`) return
//! `MarketDataError::NotFound` for unknown markets. Sequence operations
//! (`list_markets`, `search_markets`, `get_candles`) return an empty `Vec`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use super::trade_stream::{TradeStream, TradeStreamConfig, TradeStreamManager, TradeSubscription};
use crate::application::ports::{Clock, SystemClock, TradeSink};
use crate::domain::candles::{CandleGenerator, OhlcBar, Timeframe};
use crate::domain::catalog::MarketCatalog;
use crate::domain::error::MarketDataError;
use crate::domain::market::{Category, Market, MarketId};
use crate::domain::order_book::{BookDepth, OrderBook, OrderBookGenerator};
use crate::domain::quote::{Quote, QuoteGenerator};
use crate::domain::subscription::SubscriptionStats;
use crate::infrastructure::metrics::{self, Operation};

/// Bars returned when the caller does not specify a count.
pub const DEFAULT_CANDLE_COUNT: usize = 100;

/// Entries on a ranking board when the caller does not specify a limit.
pub const DEFAULT_RANK_LIMIT: usize = 20;

// =============================================================================
// Rankings
// =============================================================================

/// Ranking criterion for the "most active" board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    /// Highest 24h volume.
    Volume,
    /// Largest absolute 24h percent change.
    Movers,
    /// Highest open interest.
    OpenInterest,
}

impl RankMetric {
    /// Short keyword (`volume`, `movers`, `oi`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Movers => "movers",
            Self::OpenInterest => "oi",
        }
    }

    fn compare(self, a: &Quote, b: &Quote) -> Ordering {
        match self {
            Self::Volume => b.volume.cmp(&a.volume),
            Self::OpenInterest => b.open_interest.cmp(&a.open_interest),
            Self::Movers => b
                .change_percent_24h
                .abs()
                .total_cmp(&a.change_percent_24h.abs()),
        }
    }
}

impl FromStr for RankMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "volume" => Ok(Self::Volume),
            "movers" => Ok(Self::Movers),
            "oi" | "open_interest" => Ok(Self::OpenInterest),
            other => Err(format!("unknown ranking '{other}'")),
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A market together with its current quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    /// The market.
    pub market: Market,
    /// Its quote at ranking time.
    pub quote: Quote,
}

// =============================================================================
// Service
// =============================================================================

/// Market data facade.
///
/// # Example
///
/// ```rust
/// use market_sim::application::services::MarketDataService;
/// use market_sim::domain::order_book::BookDepth;
///
/// let service = MarketDataService::standard();
/// let cpi = service.find_market("CPI").unwrap();
/// let book = service.get_order_book(cpi.id.as_str(), BookDepth::Five).unwrap();
/// assert_eq!(book.bids.len(), 5);
/// ```
pub struct MarketDataService {
    catalog: Arc<MarketCatalog>,
    clock: Arc<dyn Clock>,
    trades: TradeStreamManager,
}

impl MarketDataService {
    /// Create a service over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<MarketCatalog>, clock: Arc<dyn Clock>, stream: TradeStreamConfig) -> Self {
        let trades = TradeStreamManager::new(Arc::clone(&catalog), Arc::clone(&clock), stream);

        tracing::info!(
            markets = catalog.len(),
            min_delay = ?stream.min_delay,
            max_delay = ?stream.max_delay,
            "Market data service created"
        );

        Self {
            catalog,
            clock,
            trades,
        }
    }

    /// Standard catalog, wall clock, default trade cadence.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(SystemClock),
            TradeStreamConfig::default(),
        )
    }

    /// The underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// List markets, optionally filtered by exact category label.
    #[must_use]
    pub fn list_markets(&self, category: Option<&str>) -> Vec<Market> {
        self.catalog.list(category)
    }

    /// List markets in a category.
    #[must_use]
    pub fn list_category(&self, category: Category) -> Vec<Market> {
        self.catalog.list_category(category)
    }

    /// Find a market by ticker (case-insensitive) or exact identifier.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::NotFound` if nothing matches.
    pub fn find_market(&self, ticker_or_id: &str) -> Result<Market, MarketDataError> {
        self.catalog.find(ticker_or_id).cloned().ok_or_else(|| {
            metrics::record_lookup_miss(Operation::FindMarket);
            MarketDataError::NotFound(ticker_or_id.to_string())
        })
    }

    /// Markets whose ticker, title or category contains `query`.
    #[must_use]
    pub fn search_markets(&self, query: &str) -> Vec<Market> {
        self.catalog.search(query)
    }

    // -------------------------------------------------------------------------
    // Generated views
    // -------------------------------------------------------------------------

    /// Current quote for a market.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::NotFound` for an unknown identifier.
    pub fn get_quote(&self, market_id: &str) -> Result<Quote, MarketDataError> {
        let market = self.market(market_id, Operation::GetQuote)?;
        metrics::record_generated(Operation::GetQuote);
        Ok(QuoteGenerator::generate(market, self.clock.now_millis()))
    }

    /// Current order book for a market.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::NotFound` for an unknown identifier.
    pub fn get_order_book(
        &self,
        market_id: &str,
        depth: BookDepth,
    ) -> Result<OrderBook, MarketDataError> {
        let market = self.market(market_id, Operation::GetOrderBook)?;
        let now = self.clock.now_millis();
        let quote = QuoteGenerator::generate(market, now);
        let mut rng = OrderBookGenerator::source_for(&market.id, now);

        metrics::record_generated(Operation::GetOrderBook);
        Ok(OrderBookGenerator::generate(&quote, depth, &mut rng, now))
    }

    /// Order book with a raw level count.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::InvalidDepth` unless `levels` is 5, 10 or
    /// 20, and `MarketDataError::NotFound` for an unknown identifier.
    pub fn get_order_book_levels(
        &self,
        market_id: &str,
        levels: usize,
    ) -> Result<OrderBook, MarketDataError> {
        let depth = BookDepth::try_from(levels)?;
        self.get_order_book(market_id, depth)
    }

    /// Historical bars for a market, oldest first. Empty for an unknown
    /// identifier. At most [`MAX_CANDLE_COUNT`](crate::domain::candles::MAX_CANDLE_COUNT)
    /// bars are returned.
    #[must_use]
    pub fn get_candles(&self, market_id: &str, timeframe: Timeframe, count: usize) -> Vec<OhlcBar> {
        let Some(market) = self.catalog.get(market_id) else {
            metrics::record_lookup_miss(Operation::GetCandles);
            return Vec::new();
        };

        let now = self.clock.now_millis();
        let quote = QuoteGenerator::generate(market, now);

        metrics::record_generated(Operation::GetCandles);
        CandleGenerator::generate(&market.id, quote.last, timeframe, count, now).collect()
    }

    /// Markets ranked by `metric`, best first, at most `limit` entries.
    #[must_use]
    pub fn rank_markets(&self, metric: RankMetric, limit: usize) -> Vec<MarketSnapshot> {
        let now = self.clock.now_millis();
        let mut snapshots: Vec<_> = self
            .catalog
            .iter()
            .map(|market| MarketSnapshot {
                market: market.clone(),
                quote: QuoteGenerator::generate(market, now),
            })
            .collect();

        snapshots.sort_by(|a, b| metric.compare(&a.quote, &b.quote));
        snapshots.truncate(limit);
        snapshots
    }

    // -------------------------------------------------------------------------
    // Trades
    // -------------------------------------------------------------------------

    /// Stream simulated trades into `sink`. Unknown markets yield an inert
    /// subscription.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe_trades<S: TradeSink>(&self, market_id: &str, sink: S) -> TradeSubscription {
        self.trades.subscribe(market_id, sink)
    }

    /// Stream simulated trades into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::NotFound` for an unknown identifier.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn try_subscribe_trades<S: TradeSink>(
        &self,
        market_id: &str,
        sink: S,
    ) -> Result<TradeSubscription, MarketDataError> {
        self.trades.try_subscribe(market_id, sink)
    }

    /// Simulated trades as a `Stream`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn trade_stream(&self, market_id: &str) -> TradeStream {
        self.trades.subscribe_channel(market_id)
    }

    /// Live trade subscription statistics.
    #[must_use]
    pub fn subscription_stats(&self) -> SubscriptionStats {
        self.trades.stats()
    }

    /// Markets with at least one live trade subscription.
    #[must_use]
    pub fn streaming_markets(&self) -> Vec<MarketId> {
        self.trades.active_markets()
    }

    /// Stop every trade subscription.
    pub fn shutdown(&self) {
        self.trades.shutdown();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.trades.is_shut_down()
    }

    fn market(&self, market_id: &str, operation: Operation) -> Result<&Market, MarketDataError> {
        self.catalog.get(market_id).ok_or_else(|| {
            metrics::record_lookup_miss(operation);
            MarketDataError::NotFound(market_id.to_string())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::application::ports::{FixedClock, MockClock};

    const NOW: i64 = 1_700_000_000_000;

    fn service() -> MarketDataService {
        MarketDataService::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(FixedClock::new(NOW)),
            TradeStreamConfig::default(),
        )
    }

    #[test]
    fn find_market_by_ticker_and_id() {
        let s = service();
        assert_eq!(s.find_market("cpi").unwrap().id.as_str(), "MKT1");
        assert_eq!(s.find_market("MKT4").unwrap().ticker, "BTC100K");
        assert_eq!(
            s.find_market("NOPE"),
            Err(MarketDataError::NotFound("NOPE".to_string()))
        );
    }

    #[test]
    fn lookups_reject_unknown_markets() {
        let s = service();
        assert!(s.get_quote("MKT0").unwrap_err().is_not_found());
        assert!(s.get_order_book("MKT0", BookDepth::Ten).unwrap_err().is_not_found());
    }

    #[test]
    fn quote_is_stamped_with_clock() {
        let s = service();
        assert_eq!(s.get_quote("MKT1").unwrap().timestamp, NOW);
    }

    #[test]
    fn order_book_matches_quote() {
        let s = service();
        let quote = s.get_quote("MKT1").unwrap();
        let book = s.get_order_book("MKT1", BookDepth::default()).unwrap();

        assert_eq!(book.bids.len(), 10);
        assert_eq!(book.best_bid().unwrap().to_bits(), quote.bid.to_bits());
        assert_eq!(book.best_ask().unwrap().to_bits(), quote.ask.to_bits());
        assert!(book.is_consistent());
    }

    #[test_case(5, true)]
    #[test_case(10, true)]
    #[test_case(20, true)]
    #[test_case(15, false)]
    fn order_book_levels(levels: usize, ok: bool) {
        let s = service();
        let result = s.get_order_book_levels("MKT2", levels);
        assert_eq!(result.is_ok(), ok);
        if let Ok(book) = result {
            assert_eq!(book.asks.len(), levels);
        }
    }

    #[test]
    fn order_book_sizes_churn_with_time() {
        let mut clock = MockClock::new();
        let mut ticks = NOW..;
        clock
            .expect_now_millis()
            .times(2)
            .returning(move || ticks.next().unwrap());
        let s = MarketDataService::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(clock),
            TradeStreamConfig::default(),
        );

        let a = s.get_order_book("MKT1", BookDepth::Five).unwrap();
        let b = s.get_order_book("MKT1", BookDepth::Five).unwrap();

        let sizes = |book: &OrderBook| book.bids.iter().map(|l| l.size).collect::<Vec<_>>();
        assert_ne!(sizes(&a), sizes(&b));
    }

    #[test]
    fn candles_for_unknown_market_are_empty() {
        let s = service();
        assert!(s.get_candles("MKT404", Timeframe::OneHour, 10).is_empty());
    }

    #[test]
    fn oversized_candle_request_is_capped() {
        let s = service();
        let bars = s.get_candles("MKT1", Timeframe::OneHour, usize::MAX);

        assert_eq!(bars.len(), crate::domain::candles::MAX_CANDLE_COUNT);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bars.last().unwrap().timestamp, NOW - 3_600_000);
    }

    #[test]
    fn candles_end_one_interval_before_now() {
        let s = service();
        let bars = s.get_candles("MKT1", Timeframe::OneMinute, DEFAULT_CANDLE_COUNT);
        assert_eq!(bars.len(), DEFAULT_CANDLE_COUNT);
        assert_eq!(bars.last().unwrap().timestamp, NOW - 60_000);
    }

    #[test]
    fn candles_use_mocked_clock() {
        let mut clock = MockClock::new();
        clock.expect_now_millis().times(1).return_const(NOW);

        let s = MarketDataService::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(clock),
            TradeStreamConfig::default(),
        );
        let bars = s.get_candles("MKT2", Timeframe::OneDay, 3);
        assert_eq!(bars[0].timestamp, NOW - 3 * 86_400_000);
    }

    #[test]
    fn rank_by_volume_is_descending() {
        let s = service();
        let board = s.rank_markets(RankMetric::Volume, DEFAULT_RANK_LIMIT);

        assert_eq!(board.len(), 12);
        for pair in board.windows(2) {
            assert!(pair[0].quote.volume >= pair[1].quote.volume);
        }
    }

    #[test]
    fn rank_movers_uses_absolute_change() {
        let s = service();
        let board = s.rank_markets(RankMetric::Movers, 5);

        assert_eq!(board.len(), 5);
        for pair in board.windows(2) {
            assert!(
                pair[0].quote.change_percent_24h.abs() >= pair[1].quote.change_percent_24h.abs()
            );
        }
    }

    #[test]
    fn rank_by_open_interest_respects_limit() {
        let s = service();
        let board = s.rank_markets(RankMetric::OpenInterest, 3);
        assert_eq!(board.len(), 3);
        assert!(board[0].quote.open_interest >= board[2].quote.open_interest);
    }

    #[test_case("volume", RankMetric::Volume)]
    #[test_case("MOVERS", RankMetric::Movers)]
    #[test_case("oi", RankMetric::OpenInterest)]
    fn rank_metric_keywords(keyword: &str, expected: RankMetric) {
        assert_eq!(keyword.parse::<RankMetric>().unwrap(), expected);
    }

    #[test]
    fn rank_metric_rejects_unknown_keyword() {
        assert!("hot".parse::<RankMetric>().is_err());
    }

    #[test]
    fn list_and_search_degrade_to_empty() {
        let s = service();
        assert_eq!(s.list_markets(None).len(), 12);
        assert_eq!(s.list_markets(Some("All")).len(), 12);
        assert!(s.list_markets(Some("economics")).is_empty());
        assert!(s.search_markets("zzz-no-match").is_empty());
        assert_eq!(s.list_category(Category::Crypto).len(), 2);
    }
}
