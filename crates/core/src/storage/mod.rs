pub mod format;
pub mod holding_store;
pub mod ledger_store;
pub mod manager;
pub mod memory;
pub mod table;
pub mod tables;
pub mod user_store;
pub mod watchlist_store;
