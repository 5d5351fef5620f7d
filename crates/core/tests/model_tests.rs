// ═══════════════════════════════════════════════════════════════════
// Model Tests: Money, CurrencyCode, accounts, transactions,
// valuation math, settings
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bulldog_finance_core::errors::CoreError;
use bulldog_finance_core::models::account::AccountKind;
use bulldog_finance_core::models::currency::CurrencyCode;
use bulldog_finance_core::models::holding::Holding;
use bulldog_finance_core::models::market::{Attempt, Quote};
use bulldog_finance_core::models::money::Money;
use bulldog_finance_core::models::overview::{PortfolioOverview, Valuation, ValuedHolding};
use bulldog_finance_core::models::settings::{parse_symbol_list, Settings, MAX_NEWS_DAYS};
use bulldog_finance_core::models::transaction::{
    BalanceAudit, Transaction, TransactionQuery, TransactionType,
};

fn txn(account_id: &str, day: u32, deleted: bool) -> Transaction {
    let at = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
    Transaction {
        user_id: "u1".into(),
        id: format!("t-{account_id}-{day}"),
        account_id: account_id.into(),
        kind: TransactionType::Income,
        amount: Money::from_minor(100),
        currency: CurrencyCode::cad(),
        category: None,
        note: None,
        occurred_at: at,
        created_at: at,
        updated_at: at,
        is_deleted: deleted,
        is_system_generated: false,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Money
// ═══════════════════════════════════════════════════════════════════

mod money {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::from_major(dec!(10.005)).unwrap().minor_units(), 1001);
        assert_eq!(Money::from_major(dec!(12.345)).unwrap().minor_units(), 1235);
        assert_eq!(Money::from_major(dec!(150.005)).unwrap().minor_units(), 15001);
        assert_eq!(Money::from_major(dec!(-0.005)).unwrap().minor_units(), -1);
        assert_eq!(Money::from_major(dec!(0.004)).unwrap().minor_units(), 0);
    }

    #[test]
    fn parse_major_accepts_plain_decimal_strings() {
        assert_eq!(Money::parse_major(" 42.10 ").unwrap().minor_units(), 4210);
        assert_eq!(Money::parse_major("-7").unwrap().minor_units(), -700);
        assert!(matches!(
            Money::parse_major("forty"),
            Err(CoreError::InvalidAmount(_))
        ));
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_minor(5790).to_string(), "57.90");
        assert_eq!(Money::from_minor(-1).to_string(), "-0.01");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn checked_arithmetic_detects_overflow() {
        assert_eq!(
            Money::from_minor(10_000).checked_sub(Money::from_minor(4210)),
            Some(Money::from_minor(5790))
        );
        assert!(Money::from_minor(i64::MAX)
            .checked_add(Money::from_minor(1))
            .is_none());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_minor(15001)).unwrap();
        assert_eq!(json, "15001");
    }

    #[test]
    fn sums_minor_units() {
        let total: Money = [100, -250, 75].into_iter().map(Money::from_minor).sum();
        assert_eq!(total, Money::from_minor(-75));
    }

    proptest! {
        #[test]
        fn cent_amounts_survive_conversion(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
            let major = Decimal::new(cents, 2);
            let money = Money::from_major(major).unwrap();
            prop_assert_eq!(money.minor_units(), cents);
            prop_assert_eq!(money.to_major(), major);
        }

        #[test]
        fn rounding_is_symmetric_around_zero(mills in 0i64..10_000_000) {
            let positive = Money::from_major(Decimal::new(mills, 3)).unwrap();
            let negative = Money::from_major(Decimal::new(-mills, 3)).unwrap();
            prop_assert_eq!(positive.minor_units(), -negative.minor_units());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyCode / AccountKind / TransactionType
// ═══════════════════════════════════════════════════════════════════

mod codes {
    use super::*;

    #[test]
    fn currency_is_trimmed_and_uppercased() {
        assert_eq!(CurrencyCode::parse(" usd ").unwrap(), "USD");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        for bad in ["", "US", "USDT", "U$D", "12A"] {
            assert!(
                matches!(CurrencyCode::parse(bad), Err(CoreError::InvalidCurrency(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn currency_fallback_only_for_missing_or_blank() {
        let cad = CurrencyCode::cad();
        assert_eq!(CurrencyCode::parse_or(None, &cad).unwrap(), "CAD");
        assert_eq!(CurrencyCode::parse_or(Some("  "), &cad).unwrap(), "CAD");
        assert_eq!(CurrencyCode::parse_or(Some("eur"), &cad).unwrap(), "EUR");
        assert!(CurrencyCode::parse_or(Some("euro"), &cad).is_err());
    }

    #[test]
    fn currency_deserialization_validates() {
        let ok: CurrencyCode = serde_json::from_str("\"jpy\"").unwrap();
        assert_eq!(ok.as_str(), "JPY");
        assert!(serde_json::from_str::<CurrencyCode>("\"yen\"").is_err());
    }

    #[test]
    fn account_kind_aliases() {
        assert_eq!(AccountKind::parse("Chequing"), AccountKind::Bank);
        assert_eq!(AccountKind::parse("credit_card"), AccountKind::Credit);
        assert_eq!(AccountKind::parse("brokerage"), AccountKind::Investment);
        assert_eq!(
            AccountKind::parse("Crypto"),
            AccountKind::Other("crypto".into())
        );
        assert_eq!(AccountKind::default(), AccountKind::Cash);
    }

    #[test]
    fn transaction_type_signs_amounts() {
        let amount = Money::from_minor(4210);
        assert_eq!(TransactionType::Income.signed(amount), Some(amount));
        assert_eq!(TransactionType::Init.signed(amount), Some(amount));
        assert_eq!(
            TransactionType::Expense.signed(amount),
            Some(Money::from_minor(-4210))
        );
        assert_eq!(TransactionType::parse("transfer").signed(amount), None);
    }

    #[test]
    fn only_income_and_expense_are_user_postable() {
        assert!(TransactionType::parse("income").is_user_postable());
        assert!(TransactionType::parse(" EXPENSE ").is_user_postable());
        assert!(!TransactionType::Init.is_user_postable());
        assert!(!TransactionType::parse("REFUND").is_user_postable());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transaction queries & audits
// ═══════════════════════════════════════════════════════════════════

mod queries {
    use super::*;

    #[test]
    fn default_query_hides_deleted_rows() {
        let query = TransactionQuery::default();
        assert!(query.matches(&txn("a1", 1, false)));
        assert!(!query.matches(&txn("a1", 1, true)));

        let with_deleted = TransactionQuery {
            include_deleted: true,
            ..TransactionQuery::default()
        };
        assert!(with_deleted.matches(&txn("a1", 1, true)));
    }

    #[test]
    fn account_filter_is_case_insensitive() {
        let query = TransactionQuery::for_account("ABC");
        assert!(query.matches(&txn("abc", 1, false)));
        assert!(!query.matches(&txn("abd", 1, false)));
    }

    #[test]
    fn date_window_is_inclusive() {
        let query = TransactionQuery {
            from: Some(Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap()),
            ..TransactionQuery::default()
        };
        assert!(!query.matches(&txn("a", 1, false)));
        assert!(query.matches(&txn("a", 2, false)));
        assert!(query.matches(&txn("a", 4, false)));
        assert!(!query.matches(&txn("a", 5, false)));
    }

    #[test]
    fn audit_reports_drift() {
        let audit = BalanceAudit {
            account_id: "a".into(),
            stored: Money::from_minor(10_000),
            derived: Money::from_minor(9_000),
            transaction_count: 2,
        };
        assert!(!audit.is_consistent());
        assert_eq!(audit.drift(), Money::from_minor(1_000));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Valuation math
// ═══════════════════════════════════════════════════════════════════

mod valuation {
    use super::*;

    #[test]
    fn gain_on_position() {
        let v = Valuation::compute(10.0, 100.0, 150.0);
        assert_eq!(v.market_value, 1500.0);
        assert_eq!(v.cost_basis, 1000.0);
        assert_eq!(v.unrealized_pnl, 500.0);
        assert!((v.unrealized_pnl_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_cost_basis_yields_zero_pnl() {
        let v = Valuation::compute(10.0, 0.0, 150.0);
        assert_eq!(v.market_value, 1500.0);
        assert_eq!(v.unrealized_pnl, 0.0);
        assert_eq!(v.unrealized_pnl_percent, 0.0);
    }

    #[test]
    fn near_zero_cost_basis_is_guarded() {
        let v = Valuation::compute(1.0, 1e-9, 10.0);
        assert_eq!(v.unrealized_pnl, 0.0);
        assert!(v.unrealized_pnl_percent.is_finite());
    }

    #[test]
    fn valued_holding_uses_the_holding_cost_basis() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let holding = Holding {
            user_id: "u1".into(),
            symbol: "XEQT".into(),
            exchange: "TO".into(),
            quantity: 4.0,
            avg_cost: 25.0,
            currency: CurrencyCode::cad(),
            tags: Vec::new(),
            notes: None,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(holding.cost_basis(), 100.0);
        assert_eq!(
            Valuation::of_holding(&holding, 30.0),
            Valuation::compute(4.0, 25.0, 30.0)
        );

        let valued = ValuedHolding::new(&holding, Quote::new(30.0, 0.5), Vec::new(), false);
        assert_eq!(valued.market_value, 120.0);
        assert_eq!(valued.unrealized_pnl, 20.0);
        assert!((valued.unrealized_pnl_percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn empty_overview_totals() {
        let overview = PortfolioOverview::default();
        assert_eq!(overview.total_market_value(), 0.0);
        assert!(!overview.is_degraded());
    }

    #[test]
    fn attempt_exposes_value_and_reason() {
        let fetched = Attempt::Fetched(Quote::new(1.0, 2.0));
        assert!(!fetched.is_degraded());
        assert_eq!(fetched.reason(), None);

        let defaulted = Attempt::defaulted(Quote::default(), "timeout");
        assert!(defaulted.is_degraded());
        assert_eq!(defaulted.reason(), Some("timeout"));
        assert_eq!(defaulted.into_value(), Quote::new(0.0, 0.0));
    }

    proptest! {
        #[test]
        fn pnl_is_market_value_minus_cost(
            quantity in 0.0f64..1e6,
            avg_cost in 0.01f64..1e4,
            price in 0.0f64..1e4,
        ) {
            let v = Valuation::compute(quantity, avg_cost, price);
            prop_assert!(v.unrealized_pnl.is_finite());
            prop_assert!(v.unrealized_pnl_percent.is_finite());
            if v.cost_basis > 1e-8 {
                prop_assert!((v.unrealized_pnl - (v.market_value - v.cost_basis)).abs() < 1e-6);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.default_currency, "CAD");
        assert_eq!(s.ledger.max_update_attempts, 5);
        assert_eq!(s.market_data.max_symbols_per_user, 10);
        assert_eq!(s.market_data.max_news_per_symbol, 3);
        assert_eq!(s.market_data.news_days, 3);
        assert_eq!(
            s.market_data.popular_symbols,
            vec!["AAPL", "MSFT", "NVDA", "TSLA", "GOOGL", "AMZN"]
        );
        assert_eq!(s.market_data.default_exchange, "US");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s = Settings::from_json_str(
            r#"{"default_currency":"usd","market_data":{"max_symbols_per_user":2}}"#,
        )
        .unwrap();
        assert_eq!(s.default_currency_code().unwrap(), "USD");
        assert_eq!(s.market_data.max_symbols_per_user, 2);
        assert_eq!(s.market_data.max_news_per_symbol, 3);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            Settings::from_json_str(r#"{"default_currency":"dollars"}"#),
            Err(CoreError::InvalidCurrency(_))
        ));
        assert!(matches!(
            Settings::from_json_str(r#"{"ledger":{"max_update_attempts":0}}"#),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"market_data":{"news_days":7}}"#).unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.market_data.news_days, 7);
    }

    #[test]
    fn environment_overrides() {
        std::env::set_var("FINNHUB_NEWS_DAYS", "5");
        std::env::set_var("FINNHUB_MAX_SYMBOLS_PER_USER", "not-a-number");
        std::env::set_var("FINNHUB_POPULAR_SYMBOLS", "spy, qqq ,,");

        let mut s = Settings::default();
        s.apply_env_overrides();

        std::env::remove_var("FINNHUB_NEWS_DAYS");
        std::env::remove_var("FINNHUB_MAX_SYMBOLS_PER_USER");
        std::env::remove_var("FINNHUB_POPULAR_SYMBOLS");

        assert_eq!(s.market_data.news_days, 5);
        assert_eq!(s.market_data.max_symbols_per_user, 10);
        assert_eq!(s.market_data.popular_symbols, vec!["spy", "qqq"]);
    }

    #[test]
    fn news_days_are_bounded() {
        let mut s = Settings::default();
        s.market_data.news_days = MAX_NEWS_DAYS;
        assert!(s.validate().is_ok());

        s.market_data.news_days = 200_000_000;
        assert!(matches!(s.validate(), Err(CoreError::Validation(_))));
        assert!(matches!(
            Settings::from_json_str(r#"{"market_data":{"news_days":200000000}}"#),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn symbol_list_drops_blanks() {
        assert_eq!(parse_symbol_list(" AAPL,,MSFT , "), vec!["AAPL", "MSFT"]);
        assert!(parse_symbol_list("").is_empty());
    }
}
