use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountKind;
use super::currency::CurrencyCode;
use super::money::Money;

/// Row key under which the single profile record of a user is stored.
pub const PROFILE_ROW_KEY: &str = "PROFILE";

/// One account the user asked for during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSeed {
    /// Seeds with a blank name are skipped.
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Falls back to the request's default currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Opening balance in major units; may be zero or negative.
    #[serde(default)]
    pub initial_balance: Decimal,
}

impl AccountSeed {
    pub fn new(name: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            name: name.into(),
            kind: None,
            currency: None,
            initial_balance,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub(crate) fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Onboarding input: the default currency and the accounts to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapRequest {
    #[serde(default)]
    pub default_currency: Option<String>,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
}

/// An account created by onboarding, with its opening balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub account_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub currency: CurrencyCode,
    pub balance: Money,
    /// Id of the INIT transaction, absent when the opening balance is zero.
    pub init_transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub default_currency: CurrencyCode,
    pub accounts: Vec<CreatedAccount>,
}

/// Per-user profile. Its `onboarding_done` flag makes bootstrap run once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub default_currency: CurrencyCode,
    pub onboarding_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, default_currency: CurrencyCode, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
            default_currency,
            onboarding_done: false,
            created_at: now,
            updated_at: now,
        }
    }
}
