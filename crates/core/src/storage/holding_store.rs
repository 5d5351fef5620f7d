use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::holding::Holding;

use super::table::{ETag, Table, Versioned};

/// Holdings keyed by `(user, symbol)`.
#[derive(Clone)]
pub struct HoldingStore {
    table: Arc<dyn Table<Holding>>,
}

impl HoldingStore {
    pub fn new(table: Arc<dyn Table<Holding>>) -> Self {
        Self { table }
    }

    pub async fn get(&self, user_id: &str, symbol: &str) -> Result<Option<Versioned<Holding>>, CoreError> {
        self.table.get(user_id, symbol).await
    }

    /// Holdings of a user in row-key (symbol) order.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Holding>, CoreError> {
        Ok(self
            .table
            .query_partition(user_id)
            .await?
            .into_iter()
            .map(|v| v.entity)
            .collect())
    }

    pub async fn insert(&self, holding: Holding) -> Result<Versioned<Holding>, CoreError> {
        self.table.insert(holding).await
    }

    pub async fn replace(&self, holding: Holding, etag: ETag) -> Result<Versioned<Holding>, CoreError> {
        self.table.replace(holding, etag).await
    }

    pub async fn delete(&self, user_id: &str, symbol: &str) -> Result<bool, CoreError> {
        self.table.delete(user_id, symbol).await
    }
}
