use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::market::{NewsItem, Quote};
use crate::models::settings::MarketDataSettings;
use super::traits::MarketDataProvider;

const PROVIDER_NAME: &str = "Finnhub";

/// Finnhub API provider for equity quotes and company news.
///
/// - **Requires**: API key, sent in the `X-Finnhub-Token` header.
/// - **Free tier**: 60 requests/minute, which is why the valuation engine
///   caps symbols and news per request.
/// - **Endpoints**: `/quote`, `/company-news`.
///
/// An unknown symbol is not an error on Finnhub's side: `/quote` answers
/// with zeros, which flow through as a zero price.
pub struct FinnhubProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, MarketDataSettings::default().base_url)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build from settings; fails when no API key is configured.
    pub fn from_settings(settings: &MarketDataSettings) -> Result<Self, CoreError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CoreError::Validation("Finnhub API key is not configured".into()))?;
        Ok(Self::with_base_url(api_key.to_string(), settings.base_url.clone()))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CoreError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("Finnhub request: {endpoint} {params:?}");

        let resp = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params)
            .send()
            .await?;

        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(api_error(format!("Rate limited on {endpoint}")));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(api_error("Invalid or missing API key".to_string()));
            }
            status if !status.is_success() => {
                return Err(api_error(format!("{endpoint} returned HTTP {status}")));
            }
            _ => {}
        }

        resp.json()
            .await
            .map_err(|e| api_error(format!("Failed to parse {endpoint} response: {e}")))
    }
}

fn api_error(message: String) -> CoreError {
    CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message,
    }
}

// ── Finnhub API response types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Percent change since previous close
    dp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NewsResponseItem {
    id: Option<i64>,
    headline: Option<String>,
    source: Option<String>,
    #[serde(default)]
    datetime: i64,
    url: Option<String>,
}

impl From<QuoteResponse> for Quote {
    fn from(resp: QuoteResponse) -> Self {
        Quote::new(resp.c.unwrap_or(0.0), resp.dp.unwrap_or(0.0))
    }
}

/// Map raw news rows to [`NewsItem`]s, keeping at most `limit`.
/// Rows without a provider id get `"{symbol}-{datetime}"`.
fn to_news_items(symbol: &str, items: Vec<NewsResponseItem>, limit: usize) -> Vec<NewsItem> {
    items
        .into_iter()
        .take(limit)
        .map(|item| NewsItem {
            id: match item.id {
                Some(id) if id != 0 => id.to_string(),
                _ => format!("{symbol}-{}", item.datetime),
            },
            headline: item.headline.unwrap_or_default(),
            source: item.source.unwrap_or_default(),
            published_at: DateTime::<Utc>::from_timestamp(item.datetime, 0).unwrap_or_default(),
            url: item.url.unwrap_or_default(),
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError> {
        let resp: QuoteResponse = self.fetch("quote", &[("symbol", symbol)]).await?;
        Ok(resp.into())
    }

    async fn get_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<NewsItem>, CoreError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let items: Vec<NewsResponseItem> = self
            .fetch(
                "company-news",
                &[("symbol", symbol), ("from", &from), ("to", &to)],
            )
            .await?;
        Ok(to_news_items(symbol, items, limit))
    }
}
