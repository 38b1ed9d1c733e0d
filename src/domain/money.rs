use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: BigDecimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: BigDecimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn from_cents(cents: i64, currency: impl Into<String>) -> Self {
        Self::new(BigDecimal::from(cents) / BigDecimal::from(100), currency)
    }

    /// Parses a remote amount string such as `"29.14"`. Unparseable input
    /// yields `None`.
    pub fn parse(amount: &str, currency: impl Into<String>) -> Option<Self> {
        BigDecimal::from_str(amount.trim())
            .ok()
            .map(|amount| Self::new(amount, currency))
    }

    /// Amount as sent on the wire: two decimal places, no currency symbol.
    pub fn amount_string(&self) -> String {
        self.amount.with_scale(2).to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount_string(), self.currency)
    }
}
