//! Application Services
//!
//! Services that compose the domain generators behind the port interfaces.
//!
//! - `MarketDataService`: Facade for catalog lookups, generated views and trade streams
//! - `TradeStreamManager`: Per-subscription trade emitters and their cancellation

mod market_data;
mod trade_stream;

pub use market_data::{
    DEFAULT_CANDLE_COUNT, DEFAULT_RANK_LIMIT, MarketDataService, MarketSnapshot, RankMetric,
};
pub use trade_stream::{
    SubscriptionState, TradeStream, TradeStreamConfig, TradeStreamManager, TradeSubscription,
};
