use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A record that lives in a partitioned key-value table.
///
/// Records are addressed by `(partition_key, row_key)`; the partition key is
/// always the owning user id.
pub trait TableEntity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Table name, used in error messages and logs.
    const TABLE: &'static str;

    fn partition_key(&self) -> &str;

    fn row_key(&self) -> &str;

    fn key(&self) -> String {
        format!("{}/{}", self.partition_key(), self.row_key())
    }
}

/// Opaque version token returned with every read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ETag(u64);

impl ETag {
    pub(crate) fn from_version(version: u64) -> Self {
        Self(version)
    }

    pub(crate) fn version(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "W/\"{}\"", self.0)
    }
}

/// An entity together with the etag it was read or written with.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<E> {
    pub entity: E,
    pub etag: ETag,
}

/// Storage contract consumed by the ledger, holdings and watchlist code.
///
/// - `get` returns `Ok(None)` for a missing key.
/// - `insert` fails with [`CoreError::AlreadyExists`] if the key is taken.
/// - `replace` fails with [`CoreError::ConcurrencyConflict`] when the supplied
///   etag is stale and with [`CoreError::NotFound`] when the row is gone.
/// - `query_partition` returns every row of one user ordered by row key;
///   any further filtering belongs to the caller.
#[async_trait]
pub trait Table<E: TableEntity>: Send + Sync {
    async fn get(&self, partition_key: &str, row_key: &str)
        -> Result<Option<Versioned<E>>, CoreError>;

    async fn insert(&self, entity: E) -> Result<Versioned<E>, CoreError>;

    async fn replace(&self, entity: E, etag: ETag) -> Result<Versioned<E>, CoreError>;

    /// Unconditional write. Only for records nobody else mutates concurrently.
    async fn upsert(&self, entity: E) -> Result<Versioned<E>, CoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, partition_key: &str, row_key: &str) -> Result<bool, CoreError>;

    async fn query_partition(&self, partition_key: &str) -> Result<Vec<Versioned<E>>, CoreError>;
}
