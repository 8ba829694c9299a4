//! Validated ticker input

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Longest accepted ticker
pub const MAX_TICKER_LEN: usize = 16;

/// A ticker that passed input validation, upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerRequest(String);

impl TickerRequest {
    /// Validate raw user input
    ///
    /// Surrounding whitespace is ignored. Symbols may contain letters, digits
    /// and `. - ^ =` (as in `BRK.B`, `BTC-USD`, `^GSPC`, `EURUSD=X`).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim();
        if ticker.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if ticker.chars().count() > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                ticker: ticker.to_string(),
                max: MAX_TICKER_LEN,
            });
        }
        if let Some(found) = ticker
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(ValidationError::InvalidTicker {
                ticker: ticker.to_string(),
                found,
            });
        }
        Ok(Self(ticker.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Assets for news analysis: this ticker, then `reference` unless equal
    pub fn with_reference(&self, reference: &str) -> Vec<String> {
        let reference = reference.trim().to_ascii_uppercase();
        if reference.is_empty() || reference == self.0 {
            vec![self.0.clone()]
        } else {
            vec![self.0.clone(), reference]
        }
    }
}

impl fmt::Display for TickerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TickerRequest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TickerRequest {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TickerRequest> for String {
    fn from(ticker: TickerRequest) -> Self {
        ticker.0
    }
}
