use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::account::{Account, AccountKind};
use crate::models::currency::CurrencyCode;
use crate::models::money::Money;
use crate::models::onboarding::{BootstrapRequest, BootstrapResult, CreatedAccount, UserProfile};
use crate::models::settings::LedgerSettings;
use crate::models::transaction::{
    BalanceAudit, NewTransaction, PostedTransaction, Transaction, TransactionQuery,
    TransactionType, INITIAL_CATEGORY, INITIAL_NOTE,
};
use crate::storage::ledger_store::LedgerStore;
use crate::storage::user_store::UserStore;

use super::{non_blank, require_user};

/// Posts transactions and keeps account balances in step with them.
///
/// Posting is two store writes: the transaction row is inserted once, then
/// the account balance goes through an etag-checked read-modify-write that
/// is retried on conflict. If the balance leg ultimately fails the
/// transaction row stays in place; `audit_balance` reports the drift.
pub struct LedgerService {
    store: LedgerStore,
    users: UserStore,
    default_currency: CurrencyCode,
    settings: LedgerSettings,
}

/// One validated bootstrap seed, ready to be written.
struct PlannedAccount {
    name: String,
    kind: AccountKind,
    currency: CurrencyCode,
    opening: Money,
}

impl LedgerService {
    pub fn new(
        store: LedgerStore,
        users: UserStore,
        default_currency: CurrencyCode,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            store,
            users,
            default_currency,
            settings,
        }
    }

    // ── Posting ─────────────────────────────────────────────────────

    /// Record an INCOME or EXPENSE against an active account and return the
    /// stored transaction with the account balance after it was applied.
    ///
    /// Everything that can be rejected (type, amount, account, currency) is
    /// checked before the first write.
    pub async fn post_transaction(
        &self,
        user_id: &str,
        request: NewTransaction,
    ) -> Result<PostedTransaction, CoreError> {
        let user_id = require_user(user_id)?;
        let account_id = request.account_id.trim();
        if account_id.is_empty() {
            return Err(CoreError::Validation("account id is required".into()));
        }

        let kind = TransactionType::parse(&request.kind);
        if !kind.is_user_postable() {
            return Err(match kind {
                TransactionType::Unknown(label) => CoreError::UnknownTransactionType(label),
                _ => CoreError::Validation(
                    "INIT transactions are created by onboarding only".into(),
                ),
            });
        }

        if request.amount.is_sign_negative() || request.amount.is_zero() {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be strictly positive, got {}",
                request.amount
            )));
        }
        let magnitude = Money::from_major(request.amount)?;
        if magnitude.is_zero() {
            return Err(CoreError::InvalidAmount(format!(
                "amount {} rounds to zero",
                request.amount
            )));
        }
        let delta = kind
            .signed(magnitude)
            .ok_or_else(|| CoreError::InvalidAmount(format!("cannot sign amount {magnitude}")))?;

        let account = self.active_account(user_id, account_id).await?;
        let currency = CurrencyCode::parse_or(request.currency.as_deref(), &account.currency)?;

        let now = Utc::now();
        let transaction = Transaction {
            user_id: user_id.to_string(),
            id: Transaction::new_id(),
            account_id: account.id.clone(),
            kind,
            amount: magnitude,
            currency,
            category: non_blank(request.category),
            note: non_blank(request.note),
            occurred_at: request.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            is_system_generated: false,
        };
        let transaction = self.store.append_transaction(transaction).await?;

        let balance_after = match self.apply_delta(user_id, &account.id, delta).await {
            Ok(balance) => balance,
            Err(e) => {
                log::error!(
                    "Transaction {} recorded but balance of account {} not updated: {e}",
                    transaction.id,
                    account.id
                );
                return Err(e);
            }
        };

        log::info!(
            "Posted {} {} to account {} (balance now {})",
            transaction.kind,
            transaction.amount,
            account.id,
            balance_after
        );
        Ok(PostedTransaction {
            transaction,
            balance_after,
        })
    }

    // ── Onboarding ──────────────────────────────────────────────────

    /// Create the user's starting accounts, each with an INIT transaction for
    /// a non-zero opening balance, then mark onboarding as done.
    ///
    /// Seeds without a name are skipped and do not consume a sort slot. All
    /// remaining seeds are validated before anything is written.
    pub async fn bootstrap(
        &self,
        user_id: &str,
        request: BootstrapRequest,
    ) -> Result<BootstrapResult, CoreError> {
        let user_id = require_user(user_id)?;

        let existing = self.users.get(user_id).await?.map(|v| v.entity);
        if existing.as_ref().is_some_and(|p| p.onboarding_done) {
            return Err(CoreError::OnboardingAlreadyCompleted(user_id.to_string()));
        }

        let default_currency =
            CurrencyCode::parse_or(request.default_currency.as_deref(), &self.default_currency)?;

        let plan = request
            .accounts
            .iter()
            .filter(|seed| seed.has_name())
            .map(|seed| {
                Ok(PlannedAccount {
                    name: seed.name.trim().to_string(),
                    kind: seed
                        .kind
                        .as_deref()
                        .filter(|k| !k.trim().is_empty())
                        .map(AccountKind::parse)
                        .unwrap_or_default(),
                    currency: CurrencyCode::parse_or(seed.currency.as_deref(), &default_currency)?,
                    opening: Money::from_major(seed.initial_balance)?,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        if plan.is_empty() {
            return Err(CoreError::Validation(
                "at least one account with a name is required".into(),
            ));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(plan.len());
        for (sort_order, planned) in (0i32..).zip(plan) {
            created.push(self.seed_account(user_id, planned, sort_order, now).await?);
        }

        let mut profile = existing
            .unwrap_or_else(|| UserProfile::new(user_id, default_currency.clone(), now));
        profile.default_currency = default_currency.clone();
        profile.onboarding_done = true;
        profile.updated_at = now;
        self.users.put(profile).await?;

        log::info!(
            "Bootstrapped {} account(s) for user {user_id} in {default_currency}",
            created.len()
        );
        Ok(BootstrapResult {
            default_currency,
            accounts: created,
        })
    }

    async fn seed_account(
        &self,
        user_id: &str,
        planned: PlannedAccount,
        sort_order: i32,
        now: DateTime<Utc>,
    ) -> Result<CreatedAccount, CoreError> {
        let account = Account::new(
            user_id,
            planned.name,
            planned.kind,
            planned.currency,
            planned.opening,
            sort_order,
            now,
        );
        let account = self.store.create_account(account).await?.entity;

        let init_transaction_id = if planned.opening.is_zero() {
            None
        } else {
            let init = Transaction {
                user_id: user_id.to_string(),
                id: Transaction::new_id(),
                account_id: account.id.clone(),
                kind: TransactionType::Init,
                amount: planned.opening,
                currency: account.currency.clone(),
                category: Some(INITIAL_CATEGORY.to_string()),
                note: Some(INITIAL_NOTE.to_string()),
                occurred_at: now,
                created_at: now,
                updated_at: now,
                is_deleted: false,
                is_system_generated: true,
            };
            Some(self.store.append_transaction(init).await?.id)
        };

        Ok(CreatedAccount {
            account_id: account.id,
            name: account.name,
            kind: account.kind,
            currency: account.currency,
            balance: account.balance,
            init_transaction_id,
        })
    }

    /// Stored profile, or the implicit one every user has before onboarding.
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, CoreError> {
        let user_id = require_user(user_id)?;
        Ok(match self.users.get(user_id).await? {
            Some(stored) => stored.entity,
            None => UserProfile::new(user_id, self.default_currency.clone(), Utc::now()),
        })
    }

    // ── Accounts ────────────────────────────────────────────────────

    pub async fn get_account(&self, user_id: &str, account_id: &str) -> Result<Account, CoreError> {
        self.store
            .get_account(require_user(user_id)?, account_id.trim())
            .await?
            .map(|v| v.entity)
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))
    }

    pub async fn list_accounts(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> Result<Vec<Account>, CoreError> {
        self.store.list_accounts(require_user(user_id)?, include_archived).await
    }

    /// Hide an account from posting. Its transactions are kept. Archiving an
    /// already archived account is a no-op.
    pub async fn archive_account(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<Account, CoreError> {
        let user_id = require_user(user_id)?;
        let now = Utc::now();
        self.update_account(user_id, account_id.trim(), "archive", |account| {
            if !account.is_archived {
                account.is_archived = true;
                account.updated_at = now;
            }
            Ok(())
        })
        .await
    }

    // ── Transactions ────────────────────────────────────────────────

    pub async fn list_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, CoreError> {
        self.store.list_transactions(require_user(user_id)?, query).await
    }

    /// Recompute an account's balance from its transaction log and compare it
    /// with the stored value. Read-only: drift is reported, never repaired.
    pub async fn audit_balance(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> Result<BalanceAudit, CoreError> {
        let user_id = require_user(user_id)?;
        let account = self.get_account(user_id, account_id).await?;
        let transactions = self
            .store
            .list_transactions(user_id, &TransactionQuery::for_account(&account.id))
            .await?;

        let mut derived = Money::ZERO;
        for txn in &transactions {
            let signed = txn.signed_amount().ok_or_else(|| {
                CoreError::UnknownTransactionType(txn.kind.as_str().to_string())
            })?;
            derived = derived.checked_add(signed).ok_or_else(|| {
                CoreError::InvalidAmount(format!("transaction sum overflows for {}", account.id))
            })?;
        }

        let audit = BalanceAudit {
            account_id: account.id,
            stored: account.balance,
            derived,
            transaction_count: transactions.len(),
        };
        if !audit.is_consistent() {
            log::warn!(
                "Balance drift on account {}: stored {} derived {}",
                audit.account_id,
                audit.stored,
                audit.derived
            );
        }
        Ok(audit)
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn active_account(&self, user_id: &str, account_id: &str) -> Result<Account, CoreError> {
        match self.store.get_account(user_id, account_id).await? {
            Some(v) if !v.entity.is_archived => Ok(v.entity),
            _ => Err(CoreError::AccountNotFound(account_id.to_string())),
        }
    }

    async fn apply_delta(
        &self,
        user_id: &str,
        account_id: &str,
        delta: Money,
    ) -> Result<Money, CoreError> {
        let now = Utc::now();
        let account = self
            .update_account(user_id, account_id, "balance update", |account| {
                account.apply_delta(delta, now).map(|_| ())
            })
            .await?;
        Ok(account.balance)
    }

    /// Read-modify-write of one account row, re-reading and retrying on an
    /// etag conflict up to `max_update_attempts` times.
    async fn update_account<F>(
        &self,
        user_id: &str,
        account_id: &str,
        operation: &str,
        mut mutate: F,
    ) -> Result<Account, CoreError>
    where
        F: FnMut(&mut Account) -> Result<(), CoreError> + Send,
    {
        let attempts = self.settings.max_update_attempts.max(1);
        for attempt in 1..=attempts {
            let current = self
                .store
                .get_account(user_id, account_id)
                .await?
                .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

            let mut account = current.entity;
            mutate(&mut account)?;

            match self.store.replace_account(account, current.etag).await {
                Ok(stored) => return Ok(stored.entity),
                Err(e) if e.is_concurrency_conflict() => {
                    log::debug!(
                        "{operation} on account {account_id} lost a race (attempt {attempt}/{attempts})"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        log::warn!("{operation} on account {account_id} gave up after {attempts} attempts");
        Err(CoreError::RetriesExhausted {
            operation: format!("{operation} on account {account_id}"),
            attempts,
        })
    }
}
