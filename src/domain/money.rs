use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in the currency's minor unit (cents for USD).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_uppercase(),
        }
    }

    pub fn usd(cents: i64) -> Self {
        Self::new(cents, "USD")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let (major, minor) = (abs / 100, abs % 100);

        if self.currency == "USD" {
            write!(f, "{}${}.{:02}", sign, major, minor)
        } else {
            write!(f, "{}{}.{:02} {}", sign, major, minor, self.currency)
        }
    }
}
