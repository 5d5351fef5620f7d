use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use super::currency::CurrencyCode;
use super::holding::DEFAULT_EXCHANGE;
use crate::errors::CoreError;

/// Upper bound accepted for `MarketDataSettings::news_days`.
pub const MAX_NEWS_DAYS: u32 = 3_650;

/// Ledger behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// How many times a read-modify-write of an account or holding is tried
    /// before giving up on etag conflicts.
    pub max_update_attempts: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            max_update_attempts: 5,
        }
    }
}

/// Market-data provider and valuation fan-out limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Cap on distinct symbols valued per overview request.
    pub max_symbols_per_user: usize,
    /// Cap on news items attached to each symbol.
    pub max_news_per_symbol: usize,
    /// News window in days, ending today.
    pub news_days: u32,
    /// Shown, in order, to users without holdings.
    pub popular_symbols: Vec<String>,
    pub default_exchange: String,
    /// Per-call timeout for quote and news requests.
    pub request_timeout_ms: u64,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            base_url: "https://finnhub.io/api/v1".to_string(),
            api_key: None,
            max_symbols_per_user: 10,
            max_news_per_symbol: 3,
            news_days: 3,
            popular_symbols: ["AAPL", "MSFT", "NVDA", "TSLA", "GOOGL", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_exchange: DEFAULT_EXCHANGE.to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

/// Everything the ledger and valuation services need, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Used when onboarding input names no currency.
    pub default_currency: String,
    pub ledger: LedgerSettings,
    pub market_data: MarketDataSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: "CAD".to_string(),
            ledger: LedgerSettings::default(),
            market_data: MarketDataSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay environment variables. Unparseable values keep the current value.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("BULLDOG_DEFAULT_CURRENCY") {
            self.default_currency = v;
        }
        if let Ok(v) = env::var("FINNHUB_API_KEY") {
            if !v.trim().is_empty() {
                self.market_data.api_key = Some(v.trim().to_string());
            }
        }
        if let Ok(v) = env::var("FINNHUB_BASE_URL") {
            self.market_data.base_url = v;
        }
        override_parsed("FINNHUB_MAX_SYMBOLS_PER_USER", &mut self.market_data.max_symbols_per_user);
        override_parsed("FINNHUB_MAX_NEWS_PER_SYMBOL", &mut self.market_data.max_news_per_symbol);
        override_parsed("FINNHUB_NEWS_DAYS", &mut self.market_data.news_days);
        override_parsed("FINNHUB_TIMEOUT_MS", &mut self.market_data.request_timeout_ms);
        override_parsed("LEDGER_MAX_UPDATE_ATTEMPTS", &mut self.ledger.max_update_attempts);
        if let Ok(v) = env::var("FINNHUB_POPULAR_SYMBOLS") {
            let symbols = parse_symbol_list(&v);
            if !symbols.is_empty() {
                self.market_data.popular_symbols = symbols;
            }
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        CurrencyCode::parse(&self.default_currency)?;
        if self.ledger.max_update_attempts == 0 {
            return Err(CoreError::Validation(
                "ledger.max_update_attempts must be at least 1".into(),
            ));
        }
        if self.market_data.news_days > MAX_NEWS_DAYS {
            return Err(CoreError::Validation(format!(
                "market_data.news_days must be at most {MAX_NEWS_DAYS}, got {}",
                self.market_data.news_days
            )));
        }
        Ok(())
    }

    /// The validated default currency.
    pub fn default_currency_code(&self) -> Result<CurrencyCode, CoreError> {
        CurrencyCode::parse(&self.default_currency)
    }
}

/// Split a comma separated symbol list, dropping blanks.
pub fn parse_symbol_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn override_parsed<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => log::warn!("Ignoring unparseable value for {key}: {raw:?}"),
        }
    }
}
