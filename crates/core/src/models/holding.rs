use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;

/// Exchange code used when neither the request nor an existing record gives one.
pub const DEFAULT_EXCHANGE: &str = "US";

/// Trim and uppercase a ticker symbol. Returns `None` for blank input.
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Trim and uppercase an exchange code. Returns `None` for blank input.
pub fn normalize_exchange(exchange: Option<&str>) -> Option<String> {
    exchange.and_then(normalize_symbol)
}

/// A recorded position in a traded symbol, independent of market price.
///
/// Keyed by `(user_id, symbol)`; the symbol is always uppercase. Every
/// upsert replaces the whole record. A zero quantity is a closed position
/// that is still tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: String,
    pub symbol: String,
    pub exchange: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub currency: CurrencyCode,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Quantity times average cost.
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_cost
    }
}

/// Client input for creating or replacing a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingUpsert {
    pub symbol: String,
    #[serde(default)]
    pub exchange: Option<String>,
    pub quantity: f64,
    pub avg_cost: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HoldingUpsert {
    pub fn new(symbol: impl Into<String>, quantity: f64, avg_cost: f64) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: None,
            quantity,
            avg_cost,
            currency: None,
            tags: Vec::new(),
            notes: None,
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
