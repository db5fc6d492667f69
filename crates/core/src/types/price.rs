//! Monetary amounts using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with its ISO 4217 currency code.
///
/// Serialized the way the Storefront API returns money: the amount as a
/// decimal string (`"12.50"`) next to `currencyCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "COP", "USD").
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// This amount multiplied by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount.round_dp(2), self.currency_code)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times() {
        let unit = Money::new(Decimal::new(1250, 2), "USD");
        assert_eq!(unit.times(3), Money::new(Decimal::new(3750, 2), "USD"));
    }

    #[test]
    fn test_deserializes_storefront_shape() {
        let money: Money =
            serde_json::from_str(r#"{"amount":"18000.0","currencyCode":"COP"}"#).unwrap();
        assert_eq!(money.amount, Decimal::new(18000, 0));
        assert_eq!(money.currency_code, "COP");
    }

    #[test]
    fn test_display() {
        let money = Money::new(Decimal::new(995, 2), "USD");
        assert_eq!(money.to_string(), "9.95 USD");
    }
}
