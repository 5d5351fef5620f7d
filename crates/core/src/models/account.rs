use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::CurrencyCode;
use super::money::Money;
use crate::errors::CoreError;

/// What kind of money an account holds.
///
/// Serialized as its lowercase label. Labels this version does not know are
/// kept verbatim in [`AccountKind::Other`] instead of being rejected, so
/// records written by a newer client still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountKind {
    Cash,
    Bank,
    Credit,
    Investment,
    Other(String),
}

impl AccountKind {
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "cash" => AccountKind::Cash,
            "bank" | "chequing" | "checking" | "savings" => AccountKind::Bank,
            "credit" | "credit_card" | "creditcard" => AccountKind::Credit,
            "investment" | "brokerage" => AccountKind::Investment,
            _ => AccountKind::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::Credit => "credit",
            AccountKind::Investment => "investment",
            AccountKind::Other(label) => label,
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        AccountKind::Cash
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AccountKind {
    fn from(label: String) -> Self {
        AccountKind::parse(&label)
    }
}

impl From<AccountKind> for String {
    fn from(kind: AccountKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A cash, bank, credit or investment account owned by one user.
///
/// `balance` always equals the signed sum of the non-deleted transactions
/// posted against the account. It only changes through transaction posting;
/// the ledger service is the single writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub currency: CurrencyCode,
    pub balance: Money,
    pub is_archived: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        currency: CurrencyCode,
        balance: Money,
        sort_order: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            kind,
            currency,
            balance,
            is_archived: false,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a signed delta to the balance and stamp `updated_at`.
    pub fn apply_delta(&mut self, delta: Money, now: DateTime<Utc>) -> Result<Money, CoreError> {
        self.balance = self.balance.checked_add(delta).ok_or_else(|| {
            CoreError::InvalidAmount(format!(
                "balance of account {} would overflow applying {delta}",
                self.id
            ))
        })?;
        self.updated_at = now;
        Ok(self.balance)
    }
}
