use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest price for a symbol. Lives only for one valuation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub percent_change: f64,
}

impl Quote {
    pub fn new(price: f64, percent_change: f64) -> Self {
        Self {
            price,
            percent_change,
        }
    }
}

/// A company news headline attached to a symbol in the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

/// Outcome of one best-effort market-data call.
///
/// A failed or timed-out call never propagates: it becomes `Defaulted`
/// carrying the fallback value and the reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Fetched(T),
    Defaulted { value: T, reason: String },
}

impl<T> Attempt<T> {
    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Attempt::Defaulted {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Attempt::Fetched(value) | Attempt::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Attempt::Fetched(value) | Attempt::Defaulted { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Attempt::Defaulted { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Attempt::Fetched(_) => None,
            Attempt::Defaulted { reason, .. } => Some(reason),
        }
    }
}
