// ═══════════════════════════════════════════════════════════════════
// Integration Tests: BulldogFinance facade end to end
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::time::Duration;

use bulldog_finance_core::errors::CoreError;
use bulldog_finance_core::models::holding::HoldingUpsert;
use bulldog_finance_core::models::market::{NewsItem, Quote};
use bulldog_finance_core::models::money::Money;
use bulldog_finance_core::models::onboarding::{AccountSeed, BootstrapRequest};
use bulldog_finance_core::models::settings::Settings;
use bulldog_finance_core::models::transaction::{NewTransaction, TransactionQuery, TransactionType};
use bulldog_finance_core::providers::gateway::MarketDataGateway;
use bulldog_finance_core::providers::traits::MarketDataProvider;
use bulldog_finance_core::storage::tables::MemoryTables;
use bulldog_finance_core::BulldogFinance;

const USER: &str = "alice";

struct FlatPriceProvider(f64);

#[async_trait]
impl MarketDataProvider for FlatPriceProvider {
    fn name(&self) -> &str {
        "FlatPrice"
    }

    async fn get_quote(&self, _symbol: &str) -> Result<Quote, CoreError> {
        Ok(Quote::new(self.0, -1.25))
    }

    async fn get_news(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        _limit: usize,
    ) -> Result<Vec<NewsItem>, CoreError> {
        Ok(Vec::new())
    }
}

fn app(price: f64) -> BulldogFinance {
    let gateway = MarketDataGateway::new(Duration::from_millis(500))
        .with_provider(Box::new(FlatPriceProvider(price)));
    BulldogFinance::in_memory(Settings::default(), gateway).unwrap()
}

async fn onboard(app: &BulldogFinance) -> (String, String) {
    let result = app
        .bootstrap(
            USER,
            BootstrapRequest {
                default_currency: Some("CAD".into()),
                accounts: vec![
                    AccountSeed::new("Wallet", dec!(20)),
                    AccountSeed::new("Chequing", dec!(1500.00)).with_kind("chequing"),
                ],
            },
        )
        .await
        .unwrap();
    (
        result.accounts[0].account_id.clone(),
        result.accounts[1].account_id.clone(),
    )
}

mod ledger_flow {
    use super::*;

    #[tokio::test]
    async fn onboarding_then_daily_use() {
        let app = app(0.0);
        let (wallet, chequing) = onboard(&app).await;

        app.post_transaction(
            USER,
            NewTransaction::new(&chequing, TransactionType::Income, dec!(2500)).with_category("Salary"),
        )
        .await
        .unwrap();
        let rent = app
            .post_transaction(
                USER,
                NewTransaction::new(&chequing, TransactionType::Expense, dec!(1800)).with_category("Rent"),
            )
            .await
            .unwrap();
        assert_eq!(rent.balance_after, Money::from_minor(220_000));

        app.post_transaction(
            USER,
            NewTransaction::new(&wallet, TransactionType::Expense, dec!(4.75)).with_note("coffee"),
        )
        .await
        .unwrap();

        let accounts = app.list_accounts(USER, false).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "Wallet");
        assert_eq!(accounts[0].balance, Money::from_minor(1525));

        let all = app
            .list_transactions(USER, &TransactionQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 5);

        for account in [&wallet, &chequing] {
            assert!(app.audit_balance(USER, account).await.unwrap().is_consistent());
        }
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let app = app(0.0);
        onboard(&app).await;

        assert!(app.list_accounts("bob", true).await.unwrap().is_empty());
        assert!(!app.profile("bob").await.unwrap().onboarding_done);
        assert!(app.profile(USER).await.unwrap().onboarding_done);
    }

    #[tokio::test]
    async fn archived_account_rejects_postings() {
        let app = app(0.0);
        let (wallet, _) = onboard(&app).await;
        app.archive_account(USER, &wallet).await.unwrap();

        let err = app
            .post_transaction(
                USER,
                NewTransaction::new(&wallet, TransactionType::Income, dec!(1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound(_)));
        assert_eq!(app.list_accounts(USER, false).await.unwrap().len(), 1);
    }
}

mod portfolio_flow {
    use super::*;

    #[tokio::test]
    async fn holdings_drive_the_overview() {
        let app = app(120.0);

        let empty = app.get_overview(USER).await.unwrap();
        assert!(empty.holdings.is_empty());
        assert_eq!(empty.popular.len(), 6);

        app.upsert_holding(USER, HoldingUpsert::new("vfv", 10.0, 100.0).with_exchange("TO"))
            .await
            .unwrap();
        app.add_to_watchlist(USER, "shop", None).await.unwrap();

        let overview = app.get_overview(USER).await.unwrap();
        assert!(overview.popular.is_empty());
        assert_eq!(overview.holdings.len(), 1);
        let vfv = &overview.holdings[0];
        assert_eq!(vfv.symbol, "VFV");
        assert_eq!(vfv.exchange, "TO");
        assert_eq!(vfv.market_value, 1200.0);
        assert_eq!(vfv.unrealized_pnl, 200.0);
        assert_eq!(vfv.change_percent, -1.25);
        assert!((overview.total_unrealized_pnl() - 200.0).abs() < 1e-9);

        assert_eq!(app.watchlist(USER).await.unwrap()[0].symbol, "SHOP");

        app.delete_holding(USER, "VFV").await.unwrap();
        assert!(app.list_holdings(USER).await.unwrap().is_empty());
        assert_eq!(app.get_overview(USER).await.unwrap().popular.len(), 6);
    }

    #[tokio::test]
    async fn finnhub_without_key_still_answers() {
        let app = BulldogFinance::with_finnhub(Settings::default()).unwrap();
        let overview = app.get_overview(USER).await.unwrap();
        assert_eq!(overview.popular.len(), 6);
        assert!(overview.popular.iter().all(|p| p.degraded && p.current_price == 0.0));
    }
}

mod snapshots {
    use super::*;

    #[tokio::test]
    async fn snapshot_restores_ledger_and_holdings() {
        let app = app(50.0);
        let (_, chequing) = onboard(&app).await;
        app.upsert_holding(USER, HoldingUpsert::new("XEQT", 3.0, 30.0))
            .await
            .unwrap();
        let bytes = app.snapshot_bytes().unwrap();

        let mut restored = super::app(50.0);
        restored.restore_from_bytes(&bytes).unwrap();

        let account = restored.get_account(USER, &chequing).await.unwrap();
        assert_eq!(account.balance, Money::from_minor(150_000));
        assert!(restored.profile(USER).await.unwrap().onboarding_done);
        assert_eq!(restored.list_holdings(USER).await.unwrap().len(), 1);

        // Restored state keeps working.
        let posted = restored
            .post_transaction(
                USER,
                NewTransaction::new(&chequing, TransactionType::Expense, dec!(0.01)),
            )
            .await
            .unwrap();
        assert_eq!(posted.balance_after, Money::from_minor(149_999));
    }

    #[tokio::test]
    async fn file_snapshot_round_trip() {
        let app = app(0.0);
        onboard(&app).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulldog.bdfn");
        let path = path.to_str().unwrap();
        app.save_to_file(path).unwrap();

        let mut loaded = super::app(0.0);
        loaded.load_from_file(path).unwrap();
        assert_eq!(loaded.list_accounts(USER, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn external_tables_cannot_snapshot() {
        let memory = MemoryTables::new();
        let app = BulldogFinance::new(
            Settings::default(),
            memory.tables(),
            MarketDataGateway::default(),
        )
        .unwrap();
        assert!(matches!(app.snapshot_bytes(), Err(CoreError::Storage(_))));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut app = super::app(0.0);
        assert!(app.restore_from_bytes(b"not a snapshot").is_err());
    }
}

mod configuration {
    use super::*;

    #[test]
    fn invalid_settings_fail_construction() {
        let settings = Settings {
            default_currency: "CA".into(),
            ..Settings::default()
        };
        let err = BulldogFinance::in_memory(settings, MarketDataGateway::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCurrency(_)));
    }

    #[tokio::test]
    async fn configured_default_currency_applies_to_bootstrap() {
        let settings = Settings {
            default_currency: "usd".into(),
            ..Settings::default()
        };
        let app = BulldogFinance::in_memory(settings, MarketDataGateway::default()).unwrap();
        let result = app
            .bootstrap(
                USER,
                BootstrapRequest {
                    default_currency: None,
                    accounts: vec![AccountSeed::new("Cash", dec!(1))],
                },
            )
            .await
            .unwrap();
        assert_eq!(result.default_currency, "USD");
        assert_eq!(result.accounts[0].currency, "USD");
    }

    #[test]
    fn debug_output_is_compact() {
        let rendered = format!("{:?}", app(1.0));
        assert!(rendered.contains("FlatPrice"));
        assert!(rendered.contains("in_memory: true"));
    }
}
