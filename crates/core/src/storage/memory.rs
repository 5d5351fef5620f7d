use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::errors::CoreError;
use super::table::{ETag, Table, TableEntity, Versioned};

type RowKey = (String, String);

#[derive(Debug)]
struct StoredRow<E> {
    entity: E,
    version: u64,
}

/// In-process [`Table`] backed by an ordered map.
///
/// Every successful write assigns a fresh, strictly increasing version, so an
/// etag handed out before a write never matches afterwards.
#[derive(Debug)]
pub struct MemoryTable<E> {
    rows: RwLock<BTreeMap<RowKey, StoredRow<E>>>,
    next_version: AtomicU64,
}

impl<E: TableEntity> MemoryTable<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_version: AtomicU64::new(1),
        }
    }

    /// Build a table pre-populated with `entities` (e.g. from a snapshot).
    pub fn with_rows(entities: impl IntoIterator<Item = E>) -> Self {
        let table = Self::new();
        {
            let mut rows = table.rows.write().unwrap_or_else(|e| e.into_inner());
            for entity in entities {
                let version = table.bump();
                rows.insert(key_of(&entity), StoredRow { entity, version });
            }
        }
        table
    }

    /// Copy of every stored entity, ordered by key.
    pub fn export_rows(&self) -> Vec<E> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.values().map(|row| row.entity.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }
}

impl<E: TableEntity> Default for MemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn key_of<E: TableEntity>(entity: &E) -> RowKey {
    (entity.partition_key().to_string(), entity.row_key().to_string())
}

#[async_trait]
impl<E: TableEntity> Table<E> for MemoryTable<E> {
    async fn get(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<Versioned<E>>, CoreError> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .get(&(partition_key.to_string(), row_key.to_string()))
            .map(|row| Versioned {
                entity: row.entity.clone(),
                etag: ETag::from_version(row.version),
            }))
    }

    async fn insert(&self, entity: E) -> Result<Versioned<E>, CoreError> {
        let key = key_of(&entity);
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        if rows.contains_key(&key) {
            return Err(CoreError::AlreadyExists {
                table: E::TABLE.to_string(),
                key: entity.key(),
            });
        }
        let version = self.bump();
        rows.insert(key, StoredRow { entity: entity.clone(), version });
        Ok(Versioned {
            entity,
            etag: ETag::from_version(version),
        })
    }

    async fn replace(&self, entity: E, etag: ETag) -> Result<Versioned<E>, CoreError> {
        let key = key_of(&entity);
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        let row = rows
            .get_mut(&key)
            .ok_or_else(|| CoreError::not_found(E::TABLE, entity.key()))?;
        if row.version != etag.version() {
            return Err(CoreError::ConcurrencyConflict {
                table: E::TABLE.to_string(),
                key: entity.key(),
            });
        }
        let version = self.bump();
        row.entity = entity.clone();
        row.version = version;
        Ok(Versioned {
            entity,
            etag: ETag::from_version(version),
        })
    }

    async fn upsert(&self, entity: E) -> Result<Versioned<E>, CoreError> {
        let key = key_of(&entity);
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        let version = self.bump();
        rows.insert(key, StoredRow { entity: entity.clone(), version });
        Ok(Versioned {
            entity,
            etag: ETag::from_version(version),
        })
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<bool, CoreError> {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .remove(&(partition_key.to_string(), row_key.to_string()))
            .is_some())
    }

    async fn query_partition(&self, partition_key: &str) -> Result<Vec<Versioned<E>>, CoreError> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        let start = (partition_key.to_string(), String::new());
        Ok(rows
            .range(start..)
            .take_while(|((pk, _), _)| pk == partition_key)
            .map(|(_, row)| Versioned {
                entity: row.entity.clone(),
                etag: ETag::from_version(row.version),
            })
            .collect())
    }
}
