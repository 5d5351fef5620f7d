use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::watchlist::WatchlistEntry;

use super::table::{Table, Versioned};

/// Set of followed symbols per user.
#[derive(Clone)]
pub struct WatchlistStore {
    table: Arc<dyn Table<WatchlistEntry>>,
}

impl WatchlistStore {
    pub fn new(table: Arc<dyn Table<WatchlistEntry>>) -> Self {
        Self { table }
    }

    pub async fn get(&self, user_id: &str, symbol: &str) -> Result<Option<WatchlistEntry>, CoreError> {
        Ok(self.table.get(user_id, symbol).await?.map(|v| v.entity))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, CoreError> {
        Ok(self
            .table
            .query_partition(user_id)
            .await?
            .into_iter()
            .map(|v| v.entity)
            .collect())
    }

    /// Membership writes are last-writer-wins; entries carry no counters.
    pub async fn put(&self, entry: WatchlistEntry) -> Result<Versioned<WatchlistEntry>, CoreError> {
        self.table.upsert(entry).await
    }

    pub async fn remove(&self, user_id: &str, symbol: &str) -> Result<bool, CoreError> {
        self.table.delete(user_id, symbol).await
    }
}
