//! Historical Candle Generation
//!
//! Produces OHLC bars as a bounded random walk that starts just below the
//! market's current last price. The walk is seeded from the market
//! identifier and the timeframe, so a given `(market, timeframe, now)`
//! always yields the same series.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::MarketDataError;
use super::market::MarketId;
use super::random::{SeededRandom, clamp_price, floor_to_u64, stable_seed};

/// Offset below the current last price where the walk begins.
const WALK_START_OFFSET: f64 = 0.05;

/// Maximum close-to-close move per bar (full width).
const MAX_STEP: f64 = 0.02;

/// Maximum wick beyond the body.
const MAX_WICK: f64 = 0.01;

/// Longest series a single request may produce.
pub const MAX_CANDLE_COUNT: usize = 10_000;

// =============================================================================
// Timeframe
// =============================================================================

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One minute.
    #[serde(rename = "1m")]
    OneMinute,
    /// Five minutes.
    #[serde(rename = "5m")]
    FiveMinutes,
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// One day.
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    /// Every supported timeframe, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::OneMinute,
            Self::FiveMinutes,
            Self::OneHour,
            Self::OneDay,
        ]
    }

    /// Interval length in milliseconds.
    #[must_use]
    pub const fn interval_millis(self) -> i64 {
        match self {
            Self::OneMinute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::OneHour => 3_600_000,
            Self::OneDay => 86_400_000,
        }
    }

    /// Short label (`1m`, `5m`, `1h`, `1d`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }
}

impl FromStr for Timeframe {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| MarketDataError::InvalidTimeframe(s.to_string()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Bar
// =============================================================================

/// One open-high-low-close bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcBar {
    /// Bar open time (Unix millis).
    pub timestamp: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Contracts traded.
    pub volume: u64,
}

impl OhlcBar {
    /// Check bar shape: the wicks enclose the body and every price sits in
    /// the probability domain.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let in_domain = |p: f64| {
            (crate::domain::PRICE_FLOOR..=crate::domain::PRICE_CEILING).contains(&p)
        };

        self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && in_domain(self.open)
            && in_domain(self.high)
            && in_domain(self.low)
            && in_domain(self.close)
    }
}

// =============================================================================
// Walk
// =============================================================================

/// Oldest-first iterator over generated bars.
///
/// Cloning a fresh walk gives an independent restart of the same series.
#[derive(Debug, Clone)]
pub struct CandleWalk {
    rng: SeededRandom,
    current: f64,
    remaining: usize,
    interval: i64,
    now_millis: i64,
}

impl CandleWalk {
    /// A walk that yields nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rng: SeededRandom::new(0),
            current: 0.0,
            remaining: 0,
            interval: 0,
            now_millis: 0,
        }
    }
}

impl Iterator for CandleWalk {
    type Item = OhlcBar;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let Some(timestamp) = i64::try_from(self.remaining)
            .ok()
            .and_then(|back| back.checked_mul(self.interval))
            .and_then(|offset| self.now_millis.checked_sub(offset))
        else {
            self.remaining = 0;
            return None;
        };
        self.remaining -= 1;

        let open = self.current;
        let close = clamp_price(open + (self.rng.next_f64() - 0.5) * MAX_STEP);
        let high = clamp_price(open.max(close) + self.rng.next_f64() * MAX_WICK);
        let low = clamp_price(open.min(close) - self.rng.next_f64() * MAX_WICK);
        let volume = floor_to_u64(self.rng.range(100.0, 600.0));
        self.current = close;

        Some(OhlcBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CandleWalk {}

impl std::iter::FusedIterator for CandleWalk {}

// =============================================================================
// Generator
// =============================================================================

/// Stateless candle generator.
pub struct CandleGenerator;

impl CandleGenerator {
    /// Seed for a `(market, timeframe)` series.
    #[must_use]
    pub fn seed_for(market_id: &MarketId, timeframe: Timeframe) -> u32 {
        stable_seed(market_id.as_str()).wrapping_add(stable_seed(timeframe.as_str()))
    }

    /// Walk `count` bars ending one interval before `now_millis`, starting
    /// from `last - 0.05`.
    ///
    /// `count` is capped at [`MAX_CANDLE_COUNT`] and at the number of whole
    /// intervals between the epoch and `now_millis`, so no bar is stamped
    /// before the epoch.
    #[must_use]
    pub fn generate(
        market_id: &MarketId,
        last: f64,
        timeframe: Timeframe,
        count: usize,
        now_millis: i64,
    ) -> CandleWalk {
        let interval = timeframe.interval_millis();
        let count = count.min(Self::max_bars(interval, now_millis));
        if count == 0 {
            return CandleWalk::empty();
        }

        CandleWalk {
            rng: SeededRandom::new(Self::seed_for(market_id, timeframe)),
            current: clamp_price(last - WALK_START_OFFSET),
            remaining: count,
            interval,
            now_millis,
        }
    }

    fn max_bars(interval: i64, now_millis: i64) -> usize {
        let elapsed = now_millis.max(0) / interval;
        usize::try_from(elapsed).map_or(MAX_CANDLE_COUNT, |n| n.min(MAX_CANDLE_COUNT))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test_case("1m", Timeframe::OneMinute, 60_000)]
    #[test_case("5m", Timeframe::FiveMinutes, 300_000)]
    #[test_case("1h", Timeframe::OneHour, 3_600_000)]
    #[test_case("1d", Timeframe::OneDay, 86_400_000)]
    fn timeframe_labels(label: &str, expected: Timeframe, millis: i64) {
        let parsed: Timeframe = label.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.interval_millis(), millis);
        assert_eq!(parsed.to_string(), label);
    }

    #[test_case("2h" ; "unsupported interval")]
    #[test_case("1H" ; "wrong case")]
    #[test_case("" ; "empty")]
    fn timeframe_rejects(label: &str) {
        assert_eq!(
            label.parse::<Timeframe>(),
            Err(MarketDataError::InvalidTimeframe(label.to_string()))
        );
    }

    #[test]
    fn timeframe_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&Timeframe::OneHour).unwrap(),
            "\"1h\""
        );
    }

    #[test]
    fn yields_exactly_count_bars() {
        let walk = CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneHour, 100, NOW);
        assert_eq!(walk.len(), 100);
        assert_eq!(walk.count(), 100);
    }

    #[test]
    fn timestamps_are_oldest_first_and_evenly_spaced() {
        let bars: Vec<_> =
            CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneHour, 100, NOW)
                .collect();

        assert_eq!(bars[0].timestamp, NOW - 100 * 3_600_000);
        assert_eq!(bars[99].timestamp, NOW - 3_600_000);
        for pair in bars.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 3_600_000);
        }
    }

    #[test]
    fn walk_chains_close_into_next_open() {
        let bars: Vec<_> =
            CandleGenerator::generate(&MarketId::new("MKT2"), 0.45, Timeframe::OneDay, 50, NOW)
                .collect();

        assert!((bars[0].open - 0.40).abs() < 1e-12);
        for pair in bars.windows(2) {
            assert_eq!(pair[0].close.to_bits(), pair[1].open.to_bits());
        }
    }

    #[test]
    fn bars_have_valid_shape_and_volume() {
        for tf in Timeframe::all() {
            for bar in CandleGenerator::generate(&MarketId::new("MKT7"), 0.31, *tf, 500, NOW) {
                assert!(bar.is_valid(), "{bar:?}");
                assert!((100..600).contains(&bar.volume));
            }
        }
    }

    #[test]
    fn walk_near_floor_stays_in_domain() {
        for bar in CandleGenerator::generate(&MarketId::new("MKT3"), 0.06, Timeframe::OneMinute, 1_000, NOW) {
            assert!(bar.is_valid(), "{bar:?}");
        }
    }

    #[test]
    fn same_inputs_same_series() {
        let id = MarketId::new("MKT4");
        let a: Vec<_> = CandleGenerator::generate(&id, 0.5, Timeframe::FiveMinutes, 20, NOW).collect();
        let b: Vec<_> = CandleGenerator::generate(&id, 0.5, Timeframe::FiveMinutes, 20, NOW).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn cloned_walk_restarts_series() {
        let walk = CandleGenerator::generate(&MarketId::new("MKT4"), 0.5, Timeframe::OneMinute, 10, NOW);
        let first: Vec<_> = walk.clone().collect();
        let second: Vec<_> = walk.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn timeframes_seed_different_walks() {
        let id = MarketId::new("MKT4");
        assert_ne!(
            CandleGenerator::seed_for(&id, Timeframe::OneMinute),
            CandleGenerator::seed_for(&id, Timeframe::OneHour)
        );
    }

    #[test]
    fn zero_count_and_empty_walk_yield_nothing() {
        assert_eq!(
            CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneDay, 0, NOW).count(),
            0
        );
        assert_eq!(CandleWalk::empty().len(), 0);
    }

    #[test_case(usize::MAX ; "usize max")]
    #[test_case(1 << 40 ; "two to the fortieth")]
    #[test_case(MAX_CANDLE_COUNT + 1 ; "one past the cap")]
    fn oversized_count_is_capped(count: usize) {
        for &tf in Timeframe::all() {
            let walk = CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, tf, count, NOW);
            assert_eq!(walk.len(), MAX_CANDLE_COUNT);

            let bars: Vec<_> = walk.collect();
            assert_eq!(bars.len(), MAX_CANDLE_COUNT);
            assert!(bars.iter().all(|b| b.timestamp < NOW && b.timestamp >= 0));
            assert_eq!(bars[0].timestamp, NOW - 10_000 * tf.interval_millis());
        }
    }

    #[test]
    fn count_never_reaches_before_epoch() {
        let now = 3 * Timeframe::OneDay.interval_millis() + 5;
        let bars: Vec<_> =
            CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneDay, 100, now)
                .collect();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, 5);

        assert_eq!(
            CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneDay, 100, -1)
                .len(),
            0
        );
    }

    #[test]
    fn bar_serializes_camel_case() {
        let bar = CandleGenerator::generate(&MarketId::new("MKT1"), 0.5, Timeframe::OneDay, 1, NOW)
            .next()
            .unwrap();
        let json = serde_json::to_value(&bar).unwrap();
        for key in ["timestamp", "open", "high", "low", "close", "volume"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
