use chrono::Utc;

use crate::errors::CoreError;
use crate::models::holding::{normalize_exchange, normalize_symbol, DEFAULT_EXCHANGE};
use crate::models::watchlist::{WatchlistEntry, MANUAL_SOURCE};
use crate::storage::table::TableEntity;
use crate::storage::watchlist_store::WatchlistStore;

use super::require_user;

pub struct WatchlistService {
    store: WatchlistStore,
}

impl WatchlistService {
    pub fn new(store: WatchlistStore) -> Self {
        Self { store }
    }

    /// Follow `symbol`. Adding an existing symbol keeps its `added_at` and
    /// only updates the exchange when one is given.
    pub async fn add(
        &self,
        user_id: &str,
        symbol: &str,
        exchange: Option<&str>,
    ) -> Result<WatchlistEntry, CoreError> {
        let user_id = require_user(user_id)?;
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| CoreError::Validation("symbol is required".into()))?;
        let exchange = normalize_exchange(exchange);

        let entry = match self.store.get(user_id, &symbol).await? {
            Some(mut existing) => {
                if let Some(exchange) = exchange {
                    existing.exchange = exchange;
                }
                existing
            }
            None => WatchlistEntry {
                user_id: user_id.to_string(),
                symbol,
                exchange: exchange.unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
                added_at: Utc::now(),
                source: MANUAL_SOURCE.to_string(),
            },
        };
        Ok(self.store.put(entry).await?.entity)
    }

    pub async fn remove(&self, user_id: &str, symbol: &str) -> Result<(), CoreError> {
        let user_id = require_user(user_id)?;
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| CoreError::Validation("symbol is required".into()))?;
        if self.store.remove(user_id, &symbol).await? {
            Ok(())
        } else {
            Err(CoreError::not_found(WatchlistEntry::TABLE, symbol))
        }
    }

    /// Followed symbols, ordered by symbol.
    pub async fn list(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, CoreError> {
        self.store.list(require_user(user_id)?).await
    }
}
