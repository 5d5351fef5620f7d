use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::CurrencyCode;
use super::money::Money;

/// Category stamped on the system-generated opening-balance transaction.
pub const INITIAL_CATEGORY: &str = "Initial";

/// Note stamped on the system-generated opening-balance transaction.
pub const INITIAL_NOTE: &str = "Initial balance";

/// Type of ledger transaction. The sign of a posting is derived from it.
///
/// Serialized as the uppercase label (`INCOME`, `EXPENSE`, `INIT`). Unknown
/// labels load as [`TransactionType::Unknown`] instead of failing. They have
/// no sign, so they cannot be posted and a balance audit over an account
/// that holds one fails with [`CoreError::UnknownTransactionType`].
///
/// [`CoreError::UnknownTransactionType`]: crate::errors::CoreError::UnknownTransactionType
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
    /// Opening balance written once per account during onboarding.
    Init,
    Unknown(String),
}

impl TransactionType {
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "INCOME" => TransactionType::Income,
            "EXPENSE" => TransactionType::Expense,
            "INIT" => TransactionType::Init,
            _ => TransactionType::Unknown(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Init => "INIT",
            TransactionType::Unknown(label) => label,
        }
    }

    /// Whether a client may submit this type. `INIT` is reserved for onboarding.
    pub fn is_user_postable(&self) -> bool {
        matches!(self, TransactionType::Income | TransactionType::Expense)
    }

    /// Apply this type's sign to an unsigned magnitude.
    /// Returns `None` for unknown types or on overflow.
    pub fn signed(&self, magnitude: Money) -> Option<Money> {
        match self {
            TransactionType::Income | TransactionType::Init => Some(magnitude),
            TransactionType::Expense => magnitude.checked_neg(),
            TransactionType::Unknown(_) => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TransactionType {
    fn from(label: String) -> Self {
        TransactionType::parse(&label)
    }
}

impl From<TransactionType> for String {
    fn from(kind: TransactionType) -> Self {
        kind.as_str().to_string()
    }
}

/// An immutable ledger entry. Only `is_deleted` may change after creation.
///
/// `amount` is an unsigned magnitude; see [`TransactionType::signed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: String,
    pub id: String,
    /// Weak reference: the transaction survives archival of its account.
    pub account_id: String,
    pub kind: TransactionType,
    pub amount: Money,
    pub currency: CurrencyCode,
    pub category: Option<String>,
    pub note: Option<String>,
    /// Business time, defaults to `created_at`.
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub is_system_generated: bool,
}

impl Transaction {
    pub(crate) fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// The signed effect of this transaction on its account's balance.
    pub fn signed_amount(&self) -> Option<Money> {
        self.kind.signed(self.amount)
    }

    /// When the transaction took effect for filtering and ordering.
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Client input for posting an INCOME or EXPENSE transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: String,
    /// Raw type label as submitted; validated by the ledger service.
    pub kind: String,
    /// Positive major-unit amount. The sign comes from `kind`.
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn new(account_id: impl Into<String>, kind: TransactionType, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            kind: kind.as_str().to_string(),
            amount,
            currency: None,
            category: None,
            note: None,
            occurred_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }
}

/// Result of a successful posting: the stored record and the balance after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedTransaction {
    pub transaction: Transaction,
    pub balance_after: Money,
}

/// Filters for listing transactions. All filters are applied in memory
/// after a single partition scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub account_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_deleted: bool,
}

impl TransactionQuery {
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if txn.is_deleted && !self.include_deleted {
            return false;
        }
        if let Some(account_id) = self.account_id.as_deref().map(str::trim) {
            if !account_id.is_empty() && !txn.account_id.eq_ignore_ascii_case(account_id) {
                return false;
            }
        }
        let at = txn.effective_at();
        if self.from.is_some_and(|from| at < from) {
            return false;
        }
        if self.to.is_some_and(|to| at > to) {
            return false;
        }
        true
    }
}

/// Read-only comparison of a stored balance with the one derived from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAudit {
    pub account_id: String,
    pub stored: Money,
    pub derived: Money,
    pub transaction_count: usize,
}

impl BalanceAudit {
    pub fn is_consistent(&self) -> bool {
        self.stored == self.derived
    }

    pub fn drift(&self) -> Money {
        Money::from_minor(self.stored.minor_units().saturating_sub(self.derived.minor_units()))
    }
}
