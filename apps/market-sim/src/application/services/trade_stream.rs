//! Trade Stream Manager
//!
//! Runs one Tokio task per trade subscription. Each task re-arms itself:
//! it draws a fresh delay, waits for it (or for cancellation), simulates a
//! trade against the market's current quote and hands it to the sink.
//!
//! # Lifecycle
//!
//! ```text
//! subscribe ──► Active ──cancel()/drop/shutdown──► Cancelled
//! subscribe (unknown market) ──► Inert
//! ```
//!
//! Cancellation stops all future scheduling. A trade already past its wait
//! when cancellation lands may still be delivered; nothing after it is.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{Clock, TradeSink};
use crate::domain::catalog::MarketCatalog;
use crate::domain::error::MarketDataError;
use crate::domain::market::{Market, MarketId};
use crate::domain::quote::QuoteGenerator;
use crate::domain::random::SeededRandom;
use crate::domain::subscription::{SubscriptionId, SubscriptionRegistry, SubscriptionStats};
use crate::domain::trade::Trade;
use crate::infrastructure::metrics;

/// Spreads consecutive subscription ids across the seed space.
const SEED_STRIDE: i64 = 7_919;

// =============================================================================
// Configuration
// =============================================================================

/// Inter-emission delay bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeStreamConfig {
    /// Shortest wait between trades (inclusive).
    pub min_delay: Duration,
    /// Longest wait between trades (exclusive).
    pub max_delay: Duration,
}

impl Default for TradeStreamConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(2_000),
        }
    }
}

impl TradeStreamConfig {
    /// Draw a delay uniformly from `[min_delay, max_delay)`.
    fn draw_delay(&self, rng: &mut SeededRandom) -> Duration {
        let low = self.min_delay.as_secs_f64();
        let high = self.max_delay.as_secs_f64().max(low);
        Duration::from_secs_f64(rng.range(low, high))
    }
}

// =============================================================================
// Subscription Handle
// =============================================================================

/// Observable state of a trade subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Emitting trades.
    Active,
    /// Cancelled; no further scheduling.
    Cancelled,
    /// Bound to an unknown market; never emits.
    Inert,
}

#[derive(Debug)]
struct LiveHandle {
    id: SubscriptionId,
    token: CancellationToken,
    registry: Arc<SubscriptionRegistry>,
}

/// Cancellation handle for a trade subscription.
///
/// Dropping the handle cancels the subscription.
#[derive(Debug)]
#[must_use = "dropping a TradeSubscription cancels it"]
pub struct TradeSubscription {
    market_id: MarketId,
    live: Option<LiveHandle>,
}

impl TradeSubscription {
    fn inert(market_id: MarketId) -> Self {
        Self {
            market_id,
            live: None,
        }
    }

    /// Subscription identifier, `None` for inert subscriptions.
    #[must_use]
    pub fn id(&self) -> Option<SubscriptionId> {
        self.live.as_ref().map(|live| live.id)
    }

    /// Market this subscription streams.
    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        match &self.live {
            None => SubscriptionState::Inert,
            Some(live) if live.token.is_cancelled() => SubscriptionState::Cancelled,
            Some(_) => SubscriptionState::Active,
        }
    }

    /// Whether the subscription will emit no further trades.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() != SubscriptionState::Active
    }

    /// Stop emitting. Idempotent and non-blocking.
    pub fn cancel(&self) {
        let Some(live) = &self.live else {
            return;
        };

        if live.token.is_cancelled() {
            return;
        }

        live.token.cancel();
        live.registry.release(live.id);
        metrics::set_active_subscriptions(live.registry.stats().active_subscriptions);

        tracing::debug!(
            subscription_id = live.id,
            market = %self.market_id,
            "Trade subscription cancelled"
        );
    }
}

impl Drop for TradeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// Channel Stream
// =============================================================================

/// Stream of trades for one subscription. Dropping it cancels the
/// subscription.
#[derive(Debug)]
pub struct TradeStream {
    subscription: TradeSubscription,
    inner: UnboundedReceiverStream<Trade>,
}

impl TradeStream {
    /// The underlying subscription handle.
    #[must_use]
    pub const fn subscription(&self) -> &TradeSubscription {
        &self.subscription
    }
}

impl Stream for TradeStream {
    type Item = Trade;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Spawns and tracks per-market trade emitters.
pub struct TradeStreamManager {
    catalog: Arc<MarketCatalog>,
    clock: Arc<dyn Clock>,
    config: TradeStreamConfig,
    registry: Arc<SubscriptionRegistry>,
    shutdown: CancellationToken,
}

impl TradeStreamManager {
    /// Create a manager over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<MarketCatalog>, clock: Arc<dyn Clock>, config: TradeStreamConfig) -> Self {
        Self {
            catalog,
            clock,
            config,
            registry: Arc::new(SubscriptionRegistry::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Delay bounds in use.
    #[must_use]
    pub const fn config(&self) -> &TradeStreamConfig {
        &self.config
    }

    /// Stream trades for `market_id` into `sink`.
    ///
    /// An unknown market, or a manager that has been shut down, yields an
    /// inert subscription that never emits.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe<S: TradeSink>(&self, market_id: &str, sink: S) -> TradeSubscription {
        match self.try_subscribe(market_id, sink) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(market = market_id, error = %e, "Inert trade subscription");
                TradeSubscription::inert(MarketId::new(market_id))
            }
        }
    }

    /// Stream trades for `market_id` into `sink`, rejecting unknown markets.
    ///
    /// After [`shutdown`](Self::shutdown) the returned subscription is inert.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::NotFound` if no market has this identifier.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn try_subscribe<S: TradeSink>(
        &self,
        market_id: &str,
        sink: S,
    ) -> Result<TradeSubscription, MarketDataError> {
        let market = self
            .catalog
            .get(market_id)
            .cloned()
            .ok_or_else(|| {
                metrics::record_lookup_miss(metrics::Operation::SubscribeTrades);
                MarketDataError::NotFound(market_id.to_string())
            })?;

        if self.shutdown.is_cancelled() {
            tracing::warn!(market = market_id, "Trade stream manager is shut down");
            return Ok(TradeSubscription::inert(market.id));
        }

        let id = self.registry.next_id();
        let token = self.shutdown.child_token();
        self.registry.register(id, market.id.clone());
        metrics::set_active_subscriptions(self.registry.stats().active_subscriptions);

        tracing::debug!(subscription_id = id, market = %market.id, "Trade subscription started");

        let emitter = Emitter {
            id,
            rng: self.seed_source(id),
            market: market.clone(),
            clock: Arc::clone(&self.clock),
            config: self.config,
            registry: Arc::clone(&self.registry),
            token: token.clone(),
        };
        tokio::spawn(emitter.run(sink));

        Ok(TradeSubscription {
            market_id: market.id,
            live: Some(LiveHandle {
                id,
                token,
                registry: Arc::clone(&self.registry),
            }),
        })
    }

    /// Stream trades for `market_id` through a channel.
    ///
    /// For an unknown market the stream ends immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe_channel(&self, market_id: &str) -> TradeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(market_id, move |trade: Trade| {
            let _ = tx.send(trade);
        });

        TradeStream {
            subscription,
            inner: UnboundedReceiverStream::new(rx),
        }
    }

    /// Live subscription statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        self.registry.stats()
    }

    /// Markets with at least one live subscription.
    #[must_use]
    pub fn active_markets(&self) -> Vec<MarketId> {
        self.registry.active_markets()
    }

    /// Cancel every live subscription. Later subscriptions are inert.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let stats = self.registry.stats();
        self.shutdown.cancel();

        tracing::info!(
            active_subscriptions = stats.active_subscriptions,
            active_markets = stats.active_markets,
            "Trade stream manager shut down"
        );
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Per-subscription source: the clock mixed with the subscription id,
    /// so no two subscriptions share a sequence.
    fn seed_source(&self, id: SubscriptionId) -> SeededRandom {
        #[allow(clippy::cast_possible_wrap)]
        let salt = (id as i64).wrapping_mul(SEED_STRIDE);
        SeededRandom::from_millis(self.clock.now_millis().wrapping_add(salt))
    }
}

impl Drop for TradeStreamManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// =============================================================================
// Emitter Task
// =============================================================================

struct Emitter {
    id: SubscriptionId,
    rng: SeededRandom,
    market: Market,
    clock: Arc<dyn Clock>,
    config: TradeStreamConfig,
    registry: Arc<SubscriptionRegistry>,
    token: CancellationToken,
}

impl Emitter {
    async fn run<S: TradeSink>(mut self, sink: S) {
        loop {
            let delay = self.config.draw_delay(&mut self.rng);

            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }

            let now = self.clock.now_millis();
            let quote = QuoteGenerator::generate(&self.market, now);
            let trade = Trade::simulate(&quote, &mut self.rng, now);

            tracing::trace!(
                subscription_id = self.id,
                market = %self.market.id,
                side = %trade.side,
                price = trade.price,
                quantity = trade.quantity,
                "Trade emitted"
            );
            metrics::record_trade_emitted(&self.market.id);

            sink.deliver(trade);
        }

        self.registry.release(self.id);
        metrics::set_active_subscriptions(self.registry.stats().active_subscriptions);

        tracing::debug!(subscription_id = self.id, market = %self.market.id, "Trade emitter stopped");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::application::ports::{FixedClock, MockClock, NoOpTradeSink};

    fn manager() -> TradeStreamManager {
        TradeStreamManager::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(FixedClock::new(1_700_000_000_000)),
            TradeStreamConfig::default(),
        )
    }

    fn counting_sink() -> (Arc<AtomicUsize>, impl TradeSink) {
        let count = Arc::new(AtomicUsize::new(0));
        let sink_count = Arc::clone(&count);
        (count, move |_trade: Trade| {
            sink_count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn delay_stays_within_bounds() {
        let config = TradeStreamConfig::default();
        let mut rng = SeededRandom::new(3);

        for _ in 0..1_000 {
            let delay = config.draw_delay(&mut rng);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay < Duration::from_millis(2_000));
        }
    }

    #[test]
    fn successive_delays_vary() {
        let config = TradeStreamConfig::default();
        let mut rng = SeededRandom::new(9);

        let delays: Vec<Duration> = (0..20).map(|_| config.draw_delay(&mut rng)).collect();
        assert!(delays.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn degenerate_range_uses_min_delay() {
        let config = TradeStreamConfig {
            min_delay: Duration::from_millis(700),
            max_delay: Duration::from_millis(100),
        };
        let mut rng = SeededRandom::new(1);
        assert_eq!(config.draw_delay(&mut rng), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn emits_until_cancelled() {
        let manager = manager();
        let (count, sink) = counting_sink();

        let sub = manager.subscribe("MKT1", sink);
        assert_eq!(sub.state(), SubscriptionState::Active);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let emitted = count.load(Ordering::SeqCst);
        // At most one trade per 500 ms, at least one per 2 s
        assert!((5..=20).contains(&emitted), "emitted {emitted}");

        sub.cancel();
        assert_eq!(sub.state(), SubscriptionState::Cancelled);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), emitted);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_market_is_inert() {
        let manager = manager();
        let (count, sink) = counting_sink();

        let sub = manager.subscribe("MKT999", sink);
        assert_eq!(sub.state(), SubscriptionState::Inert);
        assert_eq!(sub.id(), None);

        sub.cancel();
        sub.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(manager.stats(), SubscriptionStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn try_subscribe_rejects_unknown_market() {
        let manager = manager();
        let result = manager.try_subscribe("NOPE", NoOpTradeSink);
        assert_eq!(
            result.map(|s| s.state()).unwrap_err(),
            MarketDataError::NotFound("NOPE".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let manager = manager();
        let (count, sink) = counting_sink();

        drop(manager.subscribe("MKT2", sink));
        assert_eq!(manager.stats().active_subscriptions, 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_track_live_subscriptions() {
        let manager = manager();

        let a = manager.subscribe("MKT1", NoOpTradeSink);
        let b = manager.subscribe("MKT1", NoOpTradeSink);
        let c = manager.subscribe("MKT3", NoOpTradeSink);

        let stats = manager.stats();
        assert_eq!(stats.active_subscriptions, 3);
        assert_eq!(stats.active_markets, 2);

        a.cancel();
        assert_eq!(manager.stats().active_subscriptions, 2);

        drop(b);
        drop(c);
        assert_eq!(manager.stats(), SubscriptionStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything_and_blocks_new_subscriptions() {
        let manager = manager();
        let (count, sink) = counting_sink();

        let sub = manager.subscribe("MKT1", sink);
        manager.shutdown();
        assert!(sub.is_cancelled());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(manager.stats().active_subscriptions, 0);

        let late = manager.subscribe("MKT1", NoOpTradeSink);
        assert_eq!(late.state(), SubscriptionState::Inert);
        assert!(manager.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn seeds_come_from_the_clock() {
        let mut clock = MockClock::new();
        clock.expect_now_millis().return_const(1_700_000_000_000_i64);

        let manager = TradeStreamManager::new(
            Arc::new(MarketCatalog::standard()),
            Arc::new(clock),
            TradeStreamConfig::default(),
        );

        let mut a = manager.seed_source(1);
        let mut b = manager.seed_source(2);
        assert_ne!(a.next_f64().to_bits(), b.next_f64().to_bits());
    }
}
