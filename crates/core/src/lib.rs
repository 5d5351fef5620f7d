pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;

use errors::CoreError;
use models::{
    account::Account,
    holding::{Holding, HoldingUpsert},
    onboarding::{BootstrapRequest, BootstrapResult, UserProfile},
    overview::PortfolioOverview,
    settings::Settings,
    transaction::{BalanceAudit, NewTransaction, PostedTransaction, Transaction, TransactionQuery},
    watchlist::WatchlistEntry,
};
use providers::gateway::MarketDataGateway;
use services::{
    holding_service::HoldingService, ledger_service::LedgerService,
    valuation_service::ValuationService, watchlist_service::WatchlistService,
};
use storage::{
    holding_store::HoldingStore,
    ledger_store::LedgerStore,
    manager::StorageManager,
    tables::{MemoryTables, Tables},
    user_store::UserStore,
    watchlist_store::WatchlistStore,
};

/// Main entry point for the Bulldog Finance core library.
///
/// Each call is handled on its own; the only state held here is the settings
/// loaded at startup and handles to the tables and the market-data gateway.
#[must_use]
pub struct BulldogFinance {
    settings: Settings,
    gateway: Arc<MarketDataGateway>,
    /// Set when the tables live in this process and can be snapshotted.
    memory: Option<MemoryTables>,
    ledger: LedgerService,
    holdings: HoldingService,
    watchlist: WatchlistService,
    valuation: ValuationService,
}

impl std::fmt::Debug for BulldogFinance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulldogFinance")
            .field("default_currency", &self.settings.default_currency)
            .field("providers", &self.gateway.provider_names())
            .field("in_memory", &self.memory.is_some())
            .finish()
    }
}

impl BulldogFinance {
    /// Wire the services over caller-supplied tables.
    pub fn new(
        settings: Settings,
        tables: Tables,
        gateway: MarketDataGateway,
    ) -> Result<Self, CoreError> {
        Self::build(settings, tables, None, Arc::new(gateway))
    }

    /// Everything backed by in-process tables.
    pub fn in_memory(settings: Settings, gateway: MarketDataGateway) -> Result<Self, CoreError> {
        let memory = MemoryTables::new();
        Self::build(settings, memory.tables(), Some(memory), Arc::new(gateway))
    }

    /// In-process tables with Finnhub as the market-data provider when
    /// `settings.market_data.api_key` is set.
    pub fn with_finnhub(settings: Settings) -> Result<Self, CoreError> {
        let gateway = MarketDataGateway::from_settings(&settings.market_data);
        Self::in_memory(settings, gateway)
    }

    fn build(
        settings: Settings,
        tables: Tables,
        memory: Option<MemoryTables>,
        gateway: Arc<MarketDataGateway>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let default_currency = settings.default_currency_code()?;

        let ledger = LedgerService::new(
            LedgerStore::new(tables.accounts, tables.transactions),
            UserStore::new(tables.users),
            default_currency,
            settings.ledger.clone(),
        );
        let holding_store = HoldingStore::new(tables.holdings);
        let holdings = HoldingService::new(holding_store.clone(), settings.ledger.clone());
        let watchlist = WatchlistService::new(WatchlistStore::new(tables.watchlist));
        let valuation =
            ValuationService::new(holding_store, gateway.clone(), settings.market_data.clone());

        Ok(Self {
            settings,
            gateway,
            memory,
            ledger,
            holdings,
            watchlist,
            valuation,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Serialize every in-memory table. Fails for externally supplied tables.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>, CoreError> {
        StorageManager::save_to_bytes(self.memory_tables()?)
    }

    /// Replace all data with a snapshot produced by [`Self::snapshot_bytes`].
    /// Settings and the gateway are kept.
    pub fn restore_from_bytes(&mut self, data: &[u8]) -> Result<(), CoreError> {
        let memory = StorageManager::load_from_bytes(data)?;
        *self = Self::build(
            self.settings.clone(),
            memory.tables(),
            Some(memory),
            self.gateway.clone(),
        )?;
        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(self.memory_tables()?, path)
    }

    pub fn load_from_file(&mut self, path: &str) -> Result<(), CoreError> {
        let memory = StorageManager::load_from_file(path)?;
        *self = Self::build(
            self.settings.clone(),
            memory.tables(),
            Some(memory),
            self.gateway.clone(),
        )?;
        Ok(())
    }

    fn memory_tables(&self) -> Result<&MemoryTables, CoreError> {
        self.memory.as_ref().ok_or_else(|| {
            CoreError::Storage("snapshots are only available for in-memory tables".into())
        })
    }

    // ── Ledger ──────────────────────────────────────────────────────

    /// Post an INCOME or EXPENSE and return it with the new account balance.
    pub async fn post_transaction(
        &self,
        user_id: &str,
        request: NewTransaction,
    ) -> Result<PostedTransaction, CoreError> {
        self.ledger.post_transaction(user_id, request).await
    }

    /// One-time onboarding: create seed accounts with opening balances.
    pub async fn bootstrap(
        &self,
        user_id: &str,
        request: BootstrapRequest,
    ) -> Result<BootstrapResult, CoreError> {
        self.ledger.bootstrap(user_id, request).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, CoreError> {
        self.ledger.profile(user_id).await
    }

    pub async fn get_account(&self, user_id: &str, account_id: &str) -> Result<Account, CoreError> {
        self.ledger.get_account(user_id, account_id).await
    }

    pub async fn list_accounts(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Account>, CoreError> {
        self.ledger.list_accounts(user_id, include_archived).await
    }

    pub async fn archive_account(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<Account, CoreError> {
        self.ledger.archive_account(user_id, account_id).await
    }

    /// Transactions matching `query`, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, CoreError> {
        self.ledger.list_transactions(user_id, query).await
    }

    pub async fn audit_balance(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<BalanceAudit, CoreError> {
        self.ledger.audit_balance(user_id, account_id).await
    }

    // ── Holdings & watchlist ────────────────────────────────────────

    pub async fn upsert_holding(
        &self,
        user_id: &str,
        request: HoldingUpsert,
    ) -> Result<Holding, CoreError> {
        self.holdings.upsert_holding(user_id, request).await
    }

    pub async fn delete_holding(&self, user_id: &str, symbol: &str) -> Result<(), CoreError> {
        self.holdings.delete_holding(user_id, symbol).await
    }

    pub async fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>, CoreError> {
        self.holdings.list_holdings(user_id).await
    }

    pub async fn add_to_watchlist(
        &self,
        user_id: &str,
        symbol: &str,
        exchange: Option<&str>,
    ) -> Result<WatchlistEntry, CoreError> {
        self.watchlist.add(user_id, symbol, exchange).await
    }

    pub async fn remove_from_watchlist(&self, user_id: &str, symbol: &str) -> Result<(), CoreError> {
        self.watchlist.remove(user_id, symbol).await
    }

    pub async fn watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, CoreError> {
        self.watchlist.list(user_id).await
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Priced holdings with unrealized P&L, or popular symbols for a user
    /// with no holdings. Market-data failures degrade entries, never the call.
    pub async fn get_overview(&self, user_id: &str) -> Result<PortfolioOverview, CoreError> {
        self.valuation.get_overview(user_id).await
    }
}
