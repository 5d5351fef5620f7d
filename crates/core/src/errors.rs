use thiserror::Error;

/// Unified error type for the entire bulldog-finance-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown transaction type: {0:?}")]
    UnknownTransactionType(String),

    // ── Not found ───────────────────────────────────────────────────
    #[error("Account not found or archived: {0}")]
    AccountNotFound(String),

    #[error("{table} entry not found: {key}")]
    NotFound { table: String, key: String },

    // ── Conflicts ───────────────────────────────────────────────────
    #[error("{table} entry already exists: {key}")]
    AlreadyExists { table: String, key: String },

    #[error("Concurrent modification detected on {table} entry {key}")]
    ConcurrencyConflict { table: String, key: String },

    #[error("Onboarding already completed for user {0}")]
    OnboardingAlreadyCompleted(String),

    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    // ── Market data provider ────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {provider} timed out for {symbol}")]
    Timeout { provider: String, symbol: String },

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Invalid snapshot format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),
}

/// Coarse classification of a [`CoreError`], used by callers to pick a
/// stable user-visible reason without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input. Never retried.
    Validation,
    /// Referenced record is absent. Never retried.
    NotFound,
    /// Key or state conflict the caller can resolve (duplicate key, onboarding done).
    Conflict,
    /// Optimistic-concurrency retries ran out; safe to try the request again later.
    Transient,
    /// Market-data provider failure.
    External,
    /// Unclassified backend failure.
    Storage,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_)
            | CoreError::InvalidCurrency(_)
            | CoreError::InvalidAmount(_)
            | CoreError::UnknownTransactionType(_) => ErrorKind::Validation,

            CoreError::AccountNotFound(_) | CoreError::NotFound { .. } => ErrorKind::NotFound,

            CoreError::AlreadyExists { .. } | CoreError::OnboardingAlreadyCompleted(_) => {
                ErrorKind::Conflict
            }

            CoreError::ConcurrencyConflict { .. } | CoreError::RetriesExhausted { .. } => {
                ErrorKind::Transient
            }

            CoreError::Api { .. } | CoreError::Network(_) | CoreError::Timeout { .. } => {
                ErrorKind::External
            }

            CoreError::Storage(_)
            | CoreError::Serialization(_)
            | CoreError::Deserialization(_)
            | CoreError::FileIO(_)
            | CoreError::InvalidFileFormat(_)
            | CoreError::UnsupportedVersion(_) => ErrorKind::Storage,
        }
    }

    /// True for an etag mismatch, the only error the ledger retries internally.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, CoreError::ConcurrencyConflict { .. })
    }

    pub(crate) fn not_found(table: &str, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            table: table.to_string(),
            key: key.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<rust_decimal::Error> for CoreError {
    fn from(e: rust_decimal::Error) -> Self {
        CoreError::InvalidAmount(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters from URLs: reqwest errors carry the full
        // request URL and provider tokens must not end up in messages.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
