//! Seeded Pseudorandom Source
//!
//! A tiny linear congruential generator used by every generator in the
//! engine. It is deliberately independent of the host's default randomness:
//! the same seed always yields the same infinite sequence.
//!
//! ```text
//! state = (state * 9301 + 49297) mod 233280
//! next  = state / 233280
//! ```

/// LCG multiplier.
const MULTIPLIER: u64 = 9301;

/// LCG increment.
const INCREMENT: u64 = 49297;

/// LCG modulus. Every output is `state / MODULUS`, so values lie in `[0, 1)`.
const MODULUS: u64 = 233_280;

/// Deterministic pseudorandom number stream.
///
/// # Example
///
/// ```rust
/// use market_sim::domain::random::SeededRandom;
///
/// let mut a = SeededRandom::new(42);
/// let mut b = SeededRandom::new(42);
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    /// Create a source from a 32-bit seed.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    /// Create a source seeded from a Unix millisecond timestamp.
    ///
    /// The timestamp is reduced modulo the generator's modulus first. Since
    /// the recurrence is computed modulo the same value, the resulting
    /// sequence is identical to seeding with the full timestamp.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        let reduced = millis.rem_euclid(MODULUS as i64);
        Self {
            state: reduced.unsigned_abs(),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        #[allow(clippy::cast_precision_loss)]
        {
            self.state as f64 / MODULUS as f64
        }
    }

    /// Uniform value in `[low, high)`.
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }
}

/// Stable seed for a string: the wrapping sum of its character codes.
///
/// Used to tie reproducible views (quotes, candles) to a market identifier
/// instead of the wall clock.
#[must_use]
pub fn stable_seed(s: &str) -> u32 {
    s.chars().fold(0u32, |acc, c| acc.wrapping_add(u32::from(c)))
}

/// Round down a non-negative generator output to an integer quantity.
#[must_use]
pub(crate) fn floor_to_u64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            value.floor() as u64
        }
    } else {
        0
    }
}

/// Clamp a price into the probability domain `[0.01, 0.99]`.
#[must_use]
pub(crate) fn clamp_price(price: f64) -> f64 {
    price.clamp(crate::domain::PRICE_FLOOR, crate::domain::PRICE_CEILING)
}

// =============================================================================
// Tests
// =============================================================================
