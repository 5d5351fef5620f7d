use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::holding::Holding;
use crate::models::onboarding::UserProfile;
use crate::models::transaction::Transaction;
use crate::models::watchlist::WatchlistEntry;

use super::format;
use super::memory::MemoryTable;
use super::tables::MemoryTables;

/// Every row of every table, in the order the tables export them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub holdings: Vec<Holding>,
    pub watchlist: Vec<WatchlistEntry>,
    pub users: Vec<UserProfile>,
}

impl TableSnapshot {
    pub fn capture(tables: &MemoryTables) -> Self {
        Self {
            accounts: tables.accounts.export_rows(),
            transactions: tables.transactions.export_rows(),
            holdings: tables.holdings.export_rows(),
            watchlist: tables.watchlist.export_rows(),
            users: tables.users.export_rows(),
        }
    }

    /// Fresh tables holding these rows. Etags restart; old ones are invalid.
    pub fn restore(self) -> MemoryTables {
        MemoryTables {
            accounts: Arc::new(MemoryTable::with_rows(self.accounts)),
            transactions: Arc::new(MemoryTable::with_rows(self.transactions)),
            holdings: Arc::new(MemoryTable::with_rows(self.holdings)),
            watchlist: Arc::new(MemoryTable::with_rows(self.watchlist)),
            users: Arc::new(MemoryTable::with_rows(self.users)),
        }
    }
}

/// Save/load in-memory tables to/from portable snapshot bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Flow: tables → TableSnapshot → bincode → BDFN framing
    pub fn save_to_bytes(tables: &MemoryTables) -> Result<Vec<u8>, CoreError> {
        let snapshot = TableSnapshot::capture(tables);
        let payload = bincode::serialize(&snapshot)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize tables: {e}")))?;
        log::debug!(
            "Serialized snapshot: {} accounts, {} transactions, {} bytes",
            snapshot.accounts.len(),
            snapshot.transactions.len(),
            payload.len()
        );
        Ok(format::write_snapshot(format::CURRENT_VERSION, &payload))
    }

    /// Flow: BDFN bytes → parse header → bincode → TableSnapshot → tables
    pub fn load_from_bytes(data: &[u8]) -> Result<MemoryTables, CoreError> {
        let (_header, payload) = format::read_snapshot(data)?;
        let snapshot: TableSnapshot = bincode::deserialize(payload)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize tables: {e}")))?;
        Ok(snapshot.restore())
    }

    pub fn save_to_file(tables: &MemoryTables, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(tables)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<MemoryTables, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
