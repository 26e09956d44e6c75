//! Monetary amounts.
//!
//! All prices, payment amounts, and ledger deltas are decimal values in the
//! marketplace's settlement currency. The wrapper exists so a negative amount
//! can never sneak into a column that the storefront later renders as a price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount must not be negative")]
    Negative,
}

/// A non-negative monetary amount.
///
/// Serialized as a decimal string on the wire (e.g., `"10000"`), matching the
/// database `NUMERIC` representation exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a `Money` value, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Money::new(Decimal::new(-1, 0)),
            Err(MoneyError::Negative)
        );
        assert!(Money::new(Decimal::new(0, 0)).is_ok());
        assert!(Money::new(Decimal::new(10_000, 0)).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("\"-5\"").is_err());
        assert!(serde_json::from_str::<Money>("\"10000\"").is_ok());
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let price = Money::new(Decimal::new(10_000, 0)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"10000\"");
    }
}
