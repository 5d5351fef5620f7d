use chrono::NaiveDate;
use std::future::Future;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::market::{Attempt, NewsItem, Quote};
use crate::models::settings::MarketDataSettings;

use super::finnhub::FinnhubProvider;
use super::traits::MarketDataProvider;

/// Best-effort front door to the market-data providers.
///
/// Providers are tried in registration order. Each call is bounded by the
/// gateway timeout. When every provider fails, the gateway does not return
/// an error: it hands back a zero quote or an empty news list wrapped in
/// [`Attempt::Defaulted`] so a valuation can still complete.
pub struct MarketDataGateway {
    providers: Vec<Box<dyn MarketDataProvider>>,
    timeout: Duration,
}

impl MarketDataGateway {
    /// Create an empty gateway. Until a provider is registered every call
    /// comes back defaulted.
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    /// Gateway configured from settings: Finnhub is registered when an API key is set.
    pub fn from_settings(settings: &MarketDataSettings) -> Self {
        let mut gateway = Self::new(Duration::from_millis(settings.request_timeout_ms));
        match FinnhubProvider::from_settings(settings) {
            Ok(finnhub) => gateway.register(Box::new(finnhub)),
            Err(e) => log::warn!("Market data disabled: {e}"),
        }
        gateway
    }

    /// Register a provider behind the ones already present.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Box<dyn MarketDataProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current quote for `symbol`, or a zero quote if no provider answered
    /// with a usable price.
    pub async fn quote(&self, symbol: &str) -> Attempt<Quote> {
        let mut last_error = None;

        for provider in &self.providers {
            match self.bounded(provider.name(), symbol, provider.get_quote(symbol)).await {
                Ok(quote) if quote.price.is_finite() && quote.price >= 0.0 => {
                    let percent_change = if quote.percent_change.is_finite() {
                        quote.percent_change
                    } else {
                        0.0
                    };
                    return Attempt::Fetched(Quote::new(quote.price, percent_change));
                }
                Ok(quote) => {
                    last_error = Some(CoreError::Api {
                        provider: provider.name().to_string(),
                        message: format!("invalid price {} for {symbol}", quote.price),
                    });
                }
                Err(e) => last_error = Some(e),
            }
            if let Some(e) = &last_error {
                log::warn!("Quote for {symbol} from {} failed: {e}", provider.name());
            }
        }

        Attempt::defaulted(Quote::default(), failure_reason(last_error))
    }

    /// Up to `limit` news items for `symbol` in `[from, to]`, or an empty
    /// list if no provider answered.
    pub async fn news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Attempt<Vec<NewsItem>> {
        if limit == 0 {
            return Attempt::Fetched(Vec::new());
        }

        let mut last_error = None;

        for provider in &self.providers {
            match self
                .bounded(provider.name(), symbol, provider.get_news(symbol, from, to, limit))
                .await
            {
                Ok(mut items) => {
                    items.truncate(limit);
                    return Attempt::Fetched(items);
                }
                Err(e) => {
                    log::warn!("News for {symbol} from {} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Attempt::defaulted(Vec::new(), failure_reason(last_error))
    }

    async fn bounded<T>(
        &self,
        provider: &str,
        symbol: &str,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                provider: provider.to_string(),
                symbol: symbol.to_string(),
            }),
        }
    }
}

fn failure_reason(last_error: Option<CoreError>) -> String {
    last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no market data provider configured".to_string())
}

impl Default for MarketDataGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            MarketDataSettings::default().request_timeout_ms,
        ))
    }
}
