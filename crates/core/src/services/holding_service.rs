use chrono::Utc;

use crate::errors::CoreError;
use crate::models::currency::CurrencyCode;
use crate::models::holding::{
    normalize_exchange, normalize_symbol, Holding, HoldingUpsert, DEFAULT_EXCHANGE,
};
use crate::models::settings::LedgerSettings;
use crate::storage::holding_store::HoldingStore;
use crate::storage::table::TableEntity;

use super::{non_blank, require_user};

/// Manages the positions a user tracks. Holdings are replaced wholesale on
/// every upsert; there is no incremental buy/sell arithmetic.
pub struct HoldingService {
    store: HoldingStore,
    settings: LedgerSettings,
}

impl HoldingService {
    pub fn new(store: HoldingStore, settings: LedgerSettings) -> Self {
        Self { store, settings }
    }

    /// Create or fully replace the holding for `request.symbol`.
    ///
    /// Exchange and currency left empty keep the stored values, or fall back
    /// to `US` / `USD` for a new position. `created_at` survives replaces.
    pub async fn upsert_holding(
        &self,
        user_id: &str,
        request: HoldingUpsert,
    ) -> Result<Holding, CoreError> {
        let user_id = require_user(user_id)?;
        let symbol = normalize_symbol(&request.symbol)
            .ok_or_else(|| CoreError::Validation("symbol is required".into()))?;
        validate_non_negative("quantity", request.quantity)?;
        validate_non_negative("average cost", request.avg_cost)?;

        let exchange = normalize_exchange(request.exchange.as_deref());
        let currency = match request.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(CurrencyCode::parse(code)?),
            _ => None,
        };
        let tags: Vec<String> = request
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let notes = non_blank(request.notes);

        let attempts = self.settings.max_update_attempts.max(1);
        for attempt in 1..=attempts {
            let existing = self.store.get(user_id, &symbol).await?;
            let now = Utc::now();
            let previous = existing.as_ref().map(|v| &v.entity);

            let holding = Holding {
                user_id: user_id.to_string(),
                symbol: symbol.clone(),
                exchange: exchange
                    .clone()
                    .or_else(|| previous.map(|h| h.exchange.clone()))
                    .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
                quantity: request.quantity,
                avg_cost: request.avg_cost,
                currency: currency
                    .clone()
                    .or_else(|| previous.map(|h| h.currency.clone()))
                    .unwrap_or_else(CurrencyCode::usd),
                tags: tags.clone(),
                notes: notes.clone(),
                created_at: previous.map_or(now, |h| h.created_at),
                updated_at: now,
            };

            let written = match existing {
                Some(current) => self.store.replace(holding, current.etag).await,
                None => self.store.insert(holding).await,
            };
            match written {
                Ok(stored) => {
                    log::debug!("Upserted holding {symbol} for user {user_id}");
                    return Ok(stored.entity);
                }
                Err(
                    e @ (CoreError::ConcurrencyConflict { .. }
                    | CoreError::AlreadyExists { .. }
                    | CoreError::NotFound { .. }),
                ) => {
                    log::debug!(
                        "Holding {symbol} changed underneath upsert (attempt {attempt}/{attempts}): {e}"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::RetriesExhausted {
            operation: format!("upsert of holding {symbol}"),
            attempts,
        })
    }

    pub async fn delete_holding(&self, user_id: &str, symbol: &str) -> Result<(), CoreError> {
        let user_id = require_user(user_id)?;
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| CoreError::Validation("symbol is required".into()))?;
        if self.store.delete(user_id, &symbol).await? {
            Ok(())
        } else {
            Err(CoreError::not_found(Holding::TABLE, symbol))
        }
    }

    pub async fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>, CoreError> {
        self.store.list(require_user(user_id)?).await
    }
}

fn validate_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidAmount(format!(
            "{field} must be a finite, non-negative number, got {value}"
        )))
    }
}
