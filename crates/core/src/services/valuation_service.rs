use chrono::{Days, NaiveDate, Utc};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::holding::{normalize_symbol, Holding};
use crate::models::market::{NewsItem, Quote};
use crate::models::overview::{PortfolioOverview, ValuedHolding, ValuedSymbol};
use crate::models::settings::MarketDataSettings;
use crate::providers::gateway::MarketDataGateway;
use crate::storage::holding_store::HoldingStore;

use super::require_user;

/// Market data gathered for one symbol during a single overview request.
#[derive(Clone)]
struct SymbolData {
    quote: Quote,
    news: Vec<NewsItem>,
    degraded: bool,
}

/// Turns a user's holdings (or the popular-symbol list when there are none)
/// into priced, P&L-annotated rows.
///
/// Every distinct symbol costs one quote call and one news call, issued
/// concurrently. Nothing is cached between requests. A failed call degrades
/// that symbol only; the overview itself fails only when holdings cannot be
/// loaded.
pub struct ValuationService {
    holdings: HoldingStore,
    gateway: Arc<MarketDataGateway>,
    settings: MarketDataSettings,
}

impl ValuationService {
    pub fn new(
        holdings: HoldingStore,
        gateway: Arc<MarketDataGateway>,
        settings: MarketDataSettings,
    ) -> Self {
        Self {
            holdings,
            gateway,
            settings,
        }
    }

    pub async fn get_overview(&self, user_id: &str) -> Result<PortfolioOverview, CoreError> {
        let user_id = require_user(user_id)?;
        let holdings = self.holdings.list(user_id).await?;

        if holdings.is_empty() {
            return Ok(self.popular_overview().await);
        }

        let (symbols, truncated) = cap_distinct(
            holdings.iter().map(|h| h.symbol.as_str()),
            self.settings.max_symbols_per_user,
        );
        if truncated > 0 {
            log::warn!(
                "Overview for {user_id} limited to {} symbols, {truncated} left out",
                symbols.len()
            );
        }

        let market: HashMap<String, SymbolData> = symbols
            .iter()
            .cloned()
            .zip(self.fetch_all(&symbols).await)
            .collect();

        let valued = holdings
            .iter()
            .filter_map(|holding| {
                let symbol = normalize_symbol(&holding.symbol)?;
                let data = market.get(&symbol)?.clone();
                Some(self.value_holding(holding, symbol, data))
            })
            .collect();

        Ok(PortfolioOverview {
            holdings: valued,
            popular: Vec::new(),
            truncated_symbols: truncated,
        })
    }

    async fn popular_overview(&self) -> PortfolioOverview {
        let (symbols, truncated) = cap_distinct(
            self.settings.popular_symbols.iter().map(String::as_str),
            self.settings.max_symbols_per_user,
        );
        let data = self.fetch_all(&symbols).await;

        let popular = symbols
            .into_iter()
            .zip(data)
            .map(|(symbol, data)| ValuedSymbol {
                symbol,
                exchange: self.settings.default_exchange.clone(),
                current_price: data.quote.price,
                change_percent: data.quote.percent_change,
                news: data.news,
                degraded: data.degraded,
            })
            .collect();

        PortfolioOverview {
            holdings: Vec::new(),
            popular,
            truncated_symbols: truncated,
        }
    }

    fn value_holding(&self, holding: &Holding, symbol: String, data: SymbolData) -> ValuedHolding {
        let mut valued = ValuedHolding::new(holding, data.quote, data.news, data.degraded);
        valued.symbol = symbol;
        if valued.exchange.trim().is_empty() {
            valued.exchange = self.settings.default_exchange.clone();
        }
        valued
    }

    /// Fetch every symbol concurrently. Results come back in input order.
    async fn fetch_all(&self, symbols: &[String]) -> Vec<SymbolData> {
        let (from, to) = self.news_window();
        join_all(symbols.iter().map(|symbol| self.fetch_symbol(symbol, from, to))).await
    }

    async fn fetch_symbol(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> SymbolData {
        let (quote, news) = futures::join!(
            self.gateway.quote(symbol),
            self.gateway
                .news(symbol, from, to, self.settings.max_news_per_symbol)
        );
        let degraded = quote.is_degraded() || news.is_degraded();
        SymbolData {
            quote: quote.into_value(),
            news: news.into_value(),
            degraded,
        }
    }

    fn news_window(&self) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(u64::from(self.settings.news_days)))
            .unwrap_or(NaiveDate::MIN);
        (from, today)
    }
}

/// Uppercased distinct symbols in encounter order, capped at `max`, plus the
/// number of distinct symbols that did not fit.
fn cap_distinct<'a>(symbols: impl Iterator<Item = &'a str>, max: usize) -> (Vec<String>, usize) {
    let mut seen = HashSet::new();
    let distinct: Vec<String> = symbols
        .filter_map(normalize_symbol)
        .filter(|s| seen.insert(s.clone()))
        .collect();
    let truncated = distinct.len().saturating_sub(max);
    (distinct.into_iter().take(max).collect(), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_distinct_dedupes_case_insensitively_in_order() {
        let (symbols, truncated) =
            cap_distinct(["aapl", "MSFT", " AAPL ", "nvda", ""].into_iter(), 10);
        assert_eq!(symbols, vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(truncated, 0);
    }

    #[test]
    fn cap_distinct_reports_what_was_cut() {
        let (symbols, truncated) = cap_distinct(["A", "B", "C", "B", "D"].into_iter(), 2);
        assert_eq!(symbols, vec!["A", "B"]);
        assert_eq!(truncated, 2);
    }

    #[test]
    fn cap_of_zero_keeps_nothing() {
        let (symbols, truncated) = cap_distinct(["A"].into_iter(), 0);
        assert!(symbols.is_empty());
        assert_eq!(truncated, 1);
    }
}
