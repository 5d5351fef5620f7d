pub mod account;
pub mod currency;
pub mod holding;
pub mod market;
pub mod money;
pub mod onboarding;
pub mod overview;
pub mod settings;
pub mod transaction;
pub mod watchlist;
