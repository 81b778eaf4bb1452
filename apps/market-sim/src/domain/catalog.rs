//! Market Catalog
//!
//! Static registry of markets built once at startup from a template list.
//! Identifiers are assigned by template position (`MKT1`, `MKT2`, ...) and
//! each market gets an expiry somewhere in the 90 days after construction.
//! The catalog is never mutated afterwards and is shared behind an `Arc`.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::market::{Category, Market, MarketId, MarketStatus};

/// Upper bound for the random expiry offset.
pub const MAX_EXPIRY_DAYS: i64 = 90;

/// Resolution text attached to every generated market.
pub const STANDARD_RULES: &str =
    "This market resolves to YES if the condition is met by the expiry date, otherwise NO.";

// =============================================================================
// Templates
// =============================================================================

/// Blueprint for a catalog market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketTemplate {
    /// Ticker.
    pub ticker: &'static str,
    /// Title.
    pub title: &'static str,
    /// Category.
    pub category: Category,
}

impl MarketTemplate {
    /// Create a template.
    #[must_use]
    pub const fn new(ticker: &'static str, title: &'static str, category: Category) -> Self {
        Self {
            ticker,
            title,
            category,
        }
    }
}

/// The standard twelve-market list served by the terminal.
pub const STANDARD_TEMPLATES: [MarketTemplate; 12] = [
    MarketTemplate::new("CPI", "CPI > 3.5% in December", Category::Economics),
    MarketTemplate::new("UNEMPL", "Unemployment rate < 4% in Q4", Category::Economics),
    MarketTemplate::new("FED", "Fed cuts rates by 25bp in December", Category::Economics),
    MarketTemplate::new("BTC100K", "Bitcoin reaches $100k by EOY", Category::Crypto),
    MarketTemplate::new("ETH5K", "Ethereum above $5k by EOY", Category::Crypto),
    MarketTemplate::new("PREZ24", "Presidential Election Winner 2024", Category::Politics),
    MarketTemplate::new("SENATE", "Senate Majority in 2025", Category::Politics),
    MarketTemplate::new("AAPL3T", "Apple reaches $3T market cap", Category::Companies),
    MarketTemplate::new("TSLA500", "Tesla stock above $500 by Q1", Category::Companies),
    MarketTemplate::new("OPENAI", "OpenAI IPO in 2025", Category::TechAndScience),
    MarketTemplate::new("SBOWL", "Super Bowl Winner 2025", Category::Sports),
    MarketTemplate::new(
        "TEMP2C",
        "2024 Global Temp > 1.5°C above baseline",
        Category::Climate,
    ),
];

// =============================================================================
// Errors
// =============================================================================

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// A template has an empty ticker.
    #[error("template {0} has an empty ticker")]
    EmptyTicker(usize),
    /// A template has an empty title.
    #[error("template {position} ({ticker}) has an empty title")]
    EmptyTitle {
        /// 1-based template position.
        position: usize,
        /// Ticker of the offending template.
        ticker: String,
    },
    /// Two templates share a ticker (compared case-insensitively).
    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

// =============================================================================
// Catalog
// =============================================================================

/// Read-only registry of markets.
///
/// # Example
///
/// ```rust
/// use market_sim::domain::catalog::MarketCatalog;
///
/// let catalog = MarketCatalog::standard();
/// assert_eq!(catalog.len(), 12);
///
/// let cpi = catalog.find("cpi").unwrap();
/// assert_eq!(cpi.id.as_str(), "MKT1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarketCatalog {
    markets: Vec<Market>,
}

impl MarketCatalog {
    /// Build the standard catalog with expiries relative to now.
    #[must_use]
    pub fn standard() -> Self {
        let mut rng = rand::rng();
        Self::build(&STANDARD_TEMPLATES, Utc::now(), &mut rng)
            .unwrap_or_else(|_| Self::default())
    }

    /// Build a catalog from templates.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a template has an empty ticker or title, or
    /// if two templates share a ticker.
    pub fn build<R: Rng + ?Sized>(
        templates: &[MarketTemplate],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, CatalogError> {
        let max_offset_ms = Duration::days(MAX_EXPIRY_DAYS).num_milliseconds();
        let mut seen = HashSet::with_capacity(templates.len());
        let mut markets = Vec::with_capacity(templates.len());

        for (idx, template) in templates.iter().enumerate() {
            let position = idx + 1;
            let ticker = template.ticker.trim();

            if ticker.is_empty() {
                return Err(CatalogError::EmptyTicker(position));
            }
            if template.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle {
                    position,
                    ticker: ticker.to_string(),
                });
            }
            if !seen.insert(ticker.to_uppercase()) {
                return Err(CatalogError::DuplicateTicker(ticker.to_string()));
            }

            let offset = Duration::milliseconds(rng.random_range(0..max_offset_ms));

            markets.push(Market {
                id: MarketId::from_position(position),
                ticker: ticker.to_string(),
                title: template.title.to_string(),
                category: template.category,
                expiry: now + offset,
                status: MarketStatus::Active,
                description: format!("Market for: {}", template.title),
                rules: STANDARD_RULES.to_string(),
            });
        }

        tracing::debug!(markets = markets.len(), "Market catalog built");

        Ok(Self { markets })
    }

    /// List markets, optionally filtered by exact category label.
    ///
    /// `None` or `"All"` returns every market. Any other label is compared
    /// case-sensitively; an unknown label matches nothing.
    #[must_use]
    pub fn list(&self, category: Option<&str>) -> Vec<Market> {
        match category {
            None => self.markets.clone(),
            Some(label) if label == Category::ALL => self.markets.clone(),
            Some(label) => self
                .markets
                .iter()
                .filter(|m| m.category.label() == label)
                .cloned()
                .collect(),
        }
    }

    /// List markets in a category.
    #[must_use]
    pub fn list_category(&self, category: Category) -> Vec<Market> {
        self.markets
            .iter()
            .filter(|m| m.category == category)
            .cloned()
            .collect()
    }

    /// Find a market by ticker (case-insensitive) or exact identifier.
    #[must_use]
    pub fn find(&self, ticker_or_id: &str) -> Option<&Market> {
        self.markets
            .iter()
            .find(|m| m.matches_ticker_or_id(ticker_or_id))
    }

    /// Get a market by exact identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.id.as_str() == id)
    }

    /// Markets whose ticker, title or category contains `query`
    /// (case-insensitive), in catalog order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Market> {
        let needle = query.to_lowercase();
        self.markets
            .iter()
            .filter(|m| m.contains_text(&needle))
            .cloned()
            .collect()
    }

    /// Iterate over markets in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }

    /// Number of markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
