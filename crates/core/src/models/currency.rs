use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// ISO 4217-style currency code: exactly three uppercase ASCII letters.
///
/// Input is trimmed and uppercased before validation, so `" cad "` parses
/// to `CAD`. No conversion between currencies exists anywhere in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(normalized))
        } else {
            Err(CoreError::InvalidCurrency(input.to_string()))
        }
    }

    /// Parse `input` unless it is missing or blank, in which case `fallback` is used.
    pub fn parse_or(input: Option<&str>, fallback: &CurrencyCode) -> Result<Self, CoreError> {
        match input.map(str::trim) {
            Some(s) if !s.is_empty() => Self::parse(s),
            _ => Ok(fallback.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cad() -> Self {
        Self("CAD".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl PartialEq<&str> for CurrencyCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
