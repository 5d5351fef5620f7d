use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::transaction::{Transaction, TransactionQuery};

use super::table::{ETag, Table, Versioned};

/// Account balance records plus the append-only transaction log.
///
/// Accounts are replaced only with the etag they were read with.
/// Transactions are only ever inserted as new rows.
#[derive(Clone)]
pub struct LedgerStore {
    accounts: Arc<dyn Table<Account>>,
    transactions: Arc<dyn Table<Transaction>>,
}

impl LedgerStore {
    pub fn new(accounts: Arc<dyn Table<Account>>, transactions: Arc<dyn Table<Transaction>>) -> Self {
        Self {
            accounts,
            transactions,
        }
    }

    // ── Accounts ────────────────────────────────────────────────────

    pub async fn create_account(&self, account: Account) -> Result<Versioned<Account>, CoreError> {
        self.accounts.insert(account).await
    }

    pub async fn get_account(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<Option<Versioned<Account>>, CoreError> {
        self.accounts.get(user_id, account_id).await
    }

    pub async fn replace_account(
        &self,
        account: Account,
        etag: ETag,
    ) -> Result<Versioned<Account>, CoreError> {
        self.accounts.replace(account, etag).await
    }

    /// Accounts of a user ordered by `sort_order`, then name.
    pub async fn list_accounts(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Account>, CoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .query_partition(user_id)
            .await?
            .into_iter()
            .map(|v| v.entity)
            .filter(|a| include_archived || !a.is_archived)
            .collect();
        accounts.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(accounts)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Insert a new transaction. Never overwrites an existing id.
    pub async fn append_transaction(&self, txn: Transaction) -> Result<Transaction, CoreError> {
        Ok(self.transactions.insert(txn).await?.entity)
    }

    pub async fn get_transaction(
        &self,
        user_id: &str,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, CoreError> {
        Ok(self
            .transactions
            .get(user_id, transaction_id)
            .await?
            .map(|v| v.entity))
    }

    /// Transactions matching `query`, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, CoreError> {
        let mut txns: Vec<Transaction> = self
            .transactions
            .query_partition(user_id)
            .await?
            .into_iter()
            .map(|v| v.entity)
            .filter(|t| query.matches(t))
            .collect();
        txns.sort_by(|a, b| b.effective_at().cmp(&a.effective_at()));
        Ok(txns)
    }
}
