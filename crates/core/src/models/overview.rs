use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;
use super::holding::Holding;
use super::market::{NewsItem, Quote};

/// Cost bases at or below this are treated as zero when computing P&L.
pub const COST_BASIS_EPSILON: f64 = 1e-8;

/// Market value and unrealized P&L of a position at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub market_value: f64,
    pub cost_basis: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
}

impl Valuation {
    /// Value `quantity` units bought at `avg_cost` against `price`.
    ///
    /// P&L and P&L percent stay zero unless the cost basis exceeds
    /// [`COST_BASIS_EPSILON`].
    pub fn compute(quantity: f64, avg_cost: f64, price: f64) -> Self {
        Self::from_cost_basis(quantity, quantity * avg_cost, price)
    }

    /// Same as [`Valuation::compute`] for a holding whose cost basis is known.
    pub fn of_holding(holding: &Holding, price: f64) -> Self {
        Self::from_cost_basis(holding.quantity, holding.cost_basis(), price)
    }

    fn from_cost_basis(quantity: f64, cost_basis: f64, price: f64) -> Self {
        let market_value = quantity * price;
        let (unrealized_pnl, unrealized_pnl_percent) = if cost_basis > COST_BASIS_EPSILON {
            let pnl = market_value - cost_basis;
            (pnl, pnl / cost_basis * 100.0)
        } else {
            (0.0, 0.0)
        };
        Self {
            market_value,
            cost_basis,
            unrealized_pnl,
            unrealized_pnl_percent,
        }
    }
}

/// A holding combined with its live quote and recent news.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedHolding {
    pub symbol: String,
    pub exchange: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub currency: CurrencyCode,
    pub current_price: f64,
    pub change_percent: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
    pub news: Vec<NewsItem>,
    /// The quote or the news fell back to a default value.
    #[serde(default)]
    pub degraded: bool,
}

impl ValuedHolding {
    pub fn new(holding: &Holding, quote: Quote, news: Vec<NewsItem>, degraded: bool) -> Self {
        let valuation = Valuation::of_holding(holding, quote.price);
        Self {
            symbol: holding.symbol.clone(),
            exchange: holding.exchange.clone(),
            quantity: holding.quantity,
            avg_cost: holding.avg_cost,
            currency: holding.currency.clone(),
            current_price: quote.price,
            change_percent: quote.percent_change,
            market_value: valuation.market_value,
            unrealized_pnl: valuation.unrealized_pnl,
            unrealized_pnl_percent: valuation.unrealized_pnl_percent,
            news,
            degraded,
        }
    }
}

/// A symbol shown without a position (the "popular" fallback list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedSymbol {
    pub symbol: String,
    pub exchange: String,
    pub current_price: f64,
    pub change_percent: f64,
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub degraded: bool,
}

/// Dashboard view: valued holdings, or popular symbols when there are none.
/// Exactly one of the two lists is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub holdings: Vec<ValuedHolding>,
    pub popular: Vec<ValuedSymbol>,
    /// Distinct symbols dropped by the per-user symbol cap.
    #[serde(default)]
    pub truncated_symbols: usize,
}

impl PortfolioOverview {
    pub fn total_market_value(&self) -> f64 {
        self.holdings.iter().map(|h| h.market_value).sum()
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.holdings.iter().map(|h| h.unrealized_pnl).sum()
    }

    pub fn is_degraded(&self) -> bool {
        self.holdings.iter().any(|h| h.degraded) || self.popular.iter().any(|p| p.degraded)
    }
}
