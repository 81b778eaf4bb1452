//! Trade Subscription Registry
//!
//! Tracks which trade subscriptions are live and which markets they cover.
//!
//! # Design
//!
//! The registry tracks:
//! - Which market each live subscription streams
//! - Reference counts per market, so several subscriptions may share one
//! - Issuing of unique subscription identifiers
//!
//! It is bookkeeping only. Timers and cancellation live with the stream
//! manager in the application layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use super::market::MarketId;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a trade subscription.
pub type SubscriptionId = u64;

/// Registry contents guarded by a single lock.
#[derive(Debug, Default)]
struct RegistryState {
    /// Map from subscription ID to the market it streams.
    subscriptions: HashMap<SubscriptionId, MarketId>,
    /// Map from market to reference count.
    market_refcount: HashMap<MarketId, usize>,
}

impl RegistryState {
    /// Record a subscription.
    ///
    /// Returns `true` when this is the first subscription for the market.
    fn add(&mut self, id: SubscriptionId, market: MarketId) -> bool {
        if self.subscriptions.contains_key(&id) {
            return false;
        }

        let refcount = self.market_refcount.entry(market.clone()).or_insert(0);
        *refcount += 1;
        let first = *refcount == 1;

        self.subscriptions.insert(id, market);
        first
    }

    /// Forget a subscription.
    ///
    /// Returns the market when its last subscription was removed.
    fn remove(&mut self, id: SubscriptionId) -> Option<MarketId> {
        let market = self.subscriptions.remove(&id)?;

        let refcount = self.market_refcount.get_mut(&market)?;
        *refcount = refcount.saturating_sub(1);

        if *refcount == 0 {
            self.market_refcount.remove(&market);
            Some(market)
        } else {
            None
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Thread-safe registry of live trade subscriptions.
///
/// # Example
///
/// ```rust
/// use market_sim::domain::market::MarketId;
/// use market_sim::domain::subscription::SubscriptionRegistry;
///
/// let registry = SubscriptionRegistry::new();
/// let cpi = MarketId::new("MKT1");
///
/// let a = registry.next_id();
/// let b = registry.next_id();
/// assert!(registry.register(a, cpi.clone()));
/// assert!(!registry.register(b, cpi.clone()));
///
/// // Still streamed by `b`
/// assert_eq!(registry.release(a), None);
///
/// // Last subscription gone
/// assert_eq!(registry.release(b), Some(cpi));
/// ```
#[derive(Debug)]
pub struct SubscriptionRegistry {
    state: RwLock<RegistryState>,
    next_id: AtomicU64,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue a fresh subscription identifier.
    pub fn next_id(&self) -> SubscriptionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a live subscription.
    ///
    /// Returns `true` when the market had no other live subscription.
    pub fn register(&self, id: SubscriptionId, market: MarketId) -> bool {
        self.state.write().add(id, market)
    }

    /// Release a subscription. Releasing twice is a no-op.
    ///
    /// Returns the market when its last subscription was released.
    pub fn release(&self, id: SubscriptionId) -> Option<MarketId> {
        self.state.write().remove(id)
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.state.read().subscriptions.contains_key(&id)
    }

    /// Markets with at least one live subscription.
    #[must_use]
    pub fn active_markets(&self) -> Vec<MarketId> {
        self.state.read().market_refcount.keys().cloned().collect()
    }

    /// Number of live subscriptions for `market`.
    #[must_use]
    pub fn market_subscribers(&self, market: &MarketId) -> usize {
        self.state
            .read()
            .market_refcount
            .get(market)
            .copied()
            .unwrap_or_default()
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        let state = self.state.read();
        SubscriptionStats {
            active_subscriptions: state.subscriptions.len(),
            active_markets: state.market_refcount.len(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Live subscription statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionStats {
    /// Number of live subscriptions.
    pub active_subscriptions: usize,
    /// Number of distinct markets being streamed.
    pub active_markets: usize,
}

// =============================================================================
// Tests
// =============================================================================
