use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::market::{NewsItem, Quote};

/// Trait abstraction for market-data sources (quotes and company news).
///
/// Implementations report every failure as an error; deciding what to do
/// with it (fallback, default value) is the gateway's job.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Latest price and percent change for `symbol`.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, CoreError>;

    /// Company news for `symbol` published between `from` and `to` (inclusive).
    /// Implementations may return more than `limit` items; callers truncate.
    async fn get_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<NewsItem>, CoreError>;
}
