//! Simulator Configuration Settings
//!
//! Configuration types for the simulator, loaded from environment variables.

use std::time::Duration;

use crate::application::services::TradeStreamConfig;

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Health check and metrics HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8083 }
    }
}

/// Trade stream cadence settings.
#[derive(Debug, Clone)]
pub struct TradeStreamSettings {
    /// Shortest wait between trades.
    pub min_delay: Duration,
    /// Longest wait between trades (exclusive).
    pub max_delay: Duration,
}

impl Default for TradeStreamSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(2_000),
        }
    }
}

impl From<TradeStreamSettings> for TradeStreamConfig {
    fn from(settings: TradeStreamSettings) -> Self {
        Self {
            min_delay: settings.min_delay,
            max_delay: settings.max_delay,
        }
    }
}

/// Demo feed settings for the binary.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Tickers or identifiers whose trades are logged.
    pub tickers: Vec<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            tickers: vec!["CPI".to_string(), "BTC100K".to_string()],
        }
    }
}

/// Complete simulator configuration.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Trade stream cadence.
    pub trade_stream: TradeStreamSettings,
    /// Demo feed settings.
    pub feed: FeedSettings,
}

impl SimConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the trade delay range is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the trade delay range is empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerSettings {
            health_port: parse_u16(
                lookup("MARKET_SIM_HEALTH_PORT"),
                ServerSettings::default().health_port,
            ),
        };

        let trade_stream = TradeStreamSettings {
            min_delay: parse_duration_millis(
                lookup("MARKET_SIM_TRADE_MIN_DELAY_MS"),
                TradeStreamSettings::default().min_delay,
            ),
            max_delay: parse_duration_millis(
                lookup("MARKET_SIM_TRADE_MAX_DELAY_MS"),
                TradeStreamSettings::default().max_delay,
            ),
        };

        if trade_stream.min_delay >= trade_stream.max_delay {
            return Err(ConfigError::InvalidDelayRange {
                min_ms: trade_stream.min_delay.as_millis(),
                max_ms: trade_stream.max_delay.as_millis(),
            });
        }

        let feed = lookup("MARKET_SIM_FEED_TICKERS")
            .map(|raw| FeedSettings {
                tickers: parse_list(&raw),
            })
            .unwrap_or_default();

        Ok(Self {
            server,
            trade_stream,
            feed,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Trade delay bounds do not form a non-empty range.
    #[error("trade delay range is empty: min {min_ms}ms must be below max {max_ms}ms")]
    InvalidDelayRange {
        /// Configured minimum.
        min_ms: u128,
        /// Configured maximum.
        max_ms: u128,
    },
}

fn parse_u16(value: Option<String>, default: u16) -> u16 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_duration_millis(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
