//! Market Records
//!
//! Identifiers, categories and the immutable `Market` record produced by the
//! catalog at startup.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Market identifier (`MKT<n>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Prefix shared by every catalog identifier.
    pub const PREFIX: &'static str = "MKT";

    /// Create the identifier for the market at 1-based catalog position `n`.
    #[must_use]
    pub fn from_position(n: usize) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    /// Wrap an arbitrary identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for MarketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Category
// =============================================================================

/// Market category, as shown on the terminal's category tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Elections and government.
    Politics,
    /// Sporting events.
    Sports,
    /// Entertainment and culture.
    Culture,
    /// Digital assets.
    Crypto,
    /// Weather and climate.
    Climate,
    /// Macro indicators and central banks.
    Economics,
    /// Mention markets.
    Mentions,
    /// Individual companies.
    Companies,
    /// Financial markets.
    Financials,
    /// Technology and science.
    #[serde(rename = "Tech & Science")]
    TechAndScience,
    /// Public health.
    Health,
    /// World events.
    World,
}

impl Category {
    /// Filter keyword that matches every category.
    pub const ALL: &'static str = "All";

    /// Every category, in tab order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Politics,
            Self::Sports,
            Self::Culture,
            Self::Crypto,
            Self::Climate,
            Self::Economics,
            Self::Mentions,
            Self::Companies,
            Self::Financials,
            Self::TechAndScience,
            Self::Health,
            Self::World,
        ]
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Politics => "Politics",
            Self::Sports => "Sports",
            Self::Culture => "Culture",
            Self::Crypto => "Crypto",
            Self::Climate => "Climate",
            Self::Economics => "Economics",
            Self::Mentions => "Mentions",
            Self::Companies => "Companies",
            Self::Financials => "Financials",
            Self::TechAndScience => "Tech & Science",
            Self::Health => "Health",
            Self::World => "World",
        }
    }

    /// Look up a category by its exact (case-sensitive) label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Status
// =============================================================================

/// Lifecycle status of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Open for trading.
    #[default]
    Active,
    /// Trading halted, outcome pending.
    Closed,
    /// Outcome determined and paid out.
    Settled,
}

// =============================================================================
// Market
// =============================================================================

/// A binary prediction market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Catalog identifier.
    pub id: MarketId,
    /// Short ticker, e.g. `CPI`.
    pub ticker: String,
    /// Human-readable question.
    pub title: String,
    /// Category the market is listed under.
    pub category: Category,
    /// When the market stops trading.
    pub expiry: DateTime<Utc>,
    /// Lifecycle status.
    pub status: MarketStatus,
    /// Long description.
    pub description: String,
    /// Resolution rules.
    pub rules: String,
}

impl Market {
    /// Whether `query` names this market: case-insensitive ticker match or
    /// exact identifier match.
    #[must_use]
    pub fn matches_ticker_or_id(&self, query: &str) -> bool {
        self.ticker.eq_ignore_ascii_case(query) || self.id.as_str() == query
    }

    /// Whether the lower-cased ticker, title or category label contains the
    /// already lower-cased `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.ticker.to_lowercase().contains(needle)
            || self.title.to_lowercase().contains(needle)
            || self.category.label().to_lowercase().contains(needle)
    }
}

// =============================================================================
// Tests
// =============================================================================
