pub mod holding_service;
pub mod ledger_service;
pub mod valuation_service;
pub mod watchlist_service;

use crate::errors::CoreError;

/// Trimmed user id, or a validation error when it is blank.
pub(crate) fn require_user(user_id: &str) -> Result<&str, CoreError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(CoreError::Validation("user id is required".into()))
    } else {
        Ok(trimmed)
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
