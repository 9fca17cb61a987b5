//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)` and always handled as [`Decimal`],
//! never as floats. The storefront sells in a single currency, so a price is
//! just a non-negative amount with at most two fractional digits.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two fractional digits.
    #[error("price can have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed scale.
        max: u32,
    },
    /// The amount does not fit in `NUMERIC(10, 2)`.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of fractional digits.
    pub const MAX_SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound imposed by `NUMERIC(10, 2)`.
    #[must_use]
    pub fn upper_bound() -> Decimal {
        Decimal::new(100_000_000, 0)
    }

    /// Validate a decimal amount as a price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two decimal
    /// places, or exceeds the storage precision.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        if amount >= Self::upper_bound() {
            return Err(PriceError::TooLarge {
                max: Self::upper_bound(),
            });
        }
        Ok(Self(amount))
    }

    /// Price from an amount in minor units (e.g. `129_900` is `1299.00`).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or too large.
    pub fn from_minor_units(minor: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(minor, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The column CHECK keeps stored prices valid
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prices() {
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(Decimal::new(129_900, 2)).is_ok());
        assert!(Price::new(Decimal::new(5, 1)).is_ok());
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
    }

    #[test]
    fn test_too_precise_rejected() {
        assert!(matches!(
            Price::new(Decimal::new(1_001, 3)),
            Err(PriceError::TooPrecise { max: 2 })
        ));
    }

    #[test]
    fn test_trailing_zeros_are_not_too_precise() {
        // 12.5000 normalizes to 12.5
        assert!(Price::new(Decimal::new(125_000, 4)).is_ok());
    }

    #[test]
    fn test_too_large_rejected() {
        assert!(matches!(
            Price::new(Decimal::new(100_000_000, 0)),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_minor_units(129_900).unwrap().to_string(), "1299.00");
        assert_eq!(Price::new(Decimal::new(5, 1)).unwrap().to_string(), "0.50");
    }

    #[test]
    fn test_serde_as_string() {
        let price = Price::from_minor_units(59_900).unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"599.00\"");

        let parsed: Price = serde_json::from_str("\"599.00\"").unwrap();
        assert_eq!(parsed, price);
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
    }
}
