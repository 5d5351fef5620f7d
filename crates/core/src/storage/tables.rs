use std::sync::Arc;

use crate::models::account::Account;
use crate::models::holding::Holding;
use crate::models::onboarding::{UserProfile, PROFILE_ROW_KEY};
use crate::models::transaction::Transaction;
use crate::models::watchlist::WatchlistEntry;

use super::memory::MemoryTable;
use super::table::{Table, TableEntity};

impl TableEntity for Account {
    const TABLE: &'static str = "Accounts";

    fn partition_key(&self) -> &str {
        &self.user_id
    }

    fn row_key(&self) -> &str {
        &self.id
    }
}

impl TableEntity for Transaction {
    const TABLE: &'static str = "Transactions";

    fn partition_key(&self) -> &str {
        &self.user_id
    }

    fn row_key(&self) -> &str {
        &self.id
    }
}

impl TableEntity for Holding {
    const TABLE: &'static str = "Investments";

    fn partition_key(&self) -> &str {
        &self.user_id
    }

    fn row_key(&self) -> &str {
        &self.symbol
    }
}

impl TableEntity for WatchlistEntry {
    const TABLE: &'static str = "Watchlist";

    fn partition_key(&self) -> &str {
        &self.user_id
    }

    fn row_key(&self) -> &str {
        &self.symbol
    }
}

impl TableEntity for UserProfile {
    const TABLE: &'static str = "Users";

    fn partition_key(&self) -> &str {
        &self.user_id
    }

    fn row_key(&self) -> &str {
        PROFILE_ROW_KEY
    }
}

/// Handles to every table the services use. Cheap to clone.
#[derive(Clone)]
pub struct Tables {
    pub accounts: Arc<dyn Table<Account>>,
    pub transactions: Arc<dyn Table<Transaction>>,
    pub holdings: Arc<dyn Table<Holding>>,
    pub watchlist: Arc<dyn Table<WatchlistEntry>>,
    pub users: Arc<dyn Table<UserProfile>>,
}

/// Concrete in-memory tables, kept so they can be snapshotted.
#[derive(Clone, Debug, Default)]
pub struct MemoryTables {
    pub accounts: Arc<MemoryTable<Account>>,
    pub transactions: Arc<MemoryTable<Transaction>>,
    pub holdings: Arc<MemoryTable<Holding>>,
    pub watchlist: Arc<MemoryTable<WatchlistEntry>>,
    pub users: Arc<MemoryTable<UserProfile>>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type-erased handles sharing the same underlying rows.
    pub fn tables(&self) -> Tables {
        Tables {
            accounts: self.accounts.clone(),
            transactions: self.transactions.clone(),
            holdings: self.holdings.clone(),
            watchlist: self.watchlist.clone(),
            users: self.users.clone(),
        }
    }
}
