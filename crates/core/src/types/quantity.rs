//! Cart line quantities.
//!
//! A stored cart line always has a quantity of at least one. Requests that set a
//! line's quantity to zero or below mean "remove the line"; that shorthand is
//! made explicit through [`QuantityChange`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The quantity is zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// The quantity exceeds the per-line maximum.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A positive number of units on a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Largest quantity a single line may hold.
    pub const MAX: i32 = 9_999;

    /// One unit.
    pub const ONE: Self = Self(1);

    /// Validate a requested quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is below 1 or above [`Quantity::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        let value = i32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })?;
        Ok(Self(value))
    }

    /// The raw unit count.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// The effect of a "set quantity" request on an existing cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Replace the line's quantity.
    Set(Quantity),
    /// Delete the line.
    Remove,
}

impl QuantityChange {
    /// Interpret a requested quantity: zero or below removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if a positive request exceeds the
    /// per-line maximum.
    pub fn from_requested(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Ok(Self::Remove);
        }
        Quantity::new(value).map(Self::Set)
    }

    /// Whether this change deletes the line.
    #[must_use]
    pub const fn is_remove(&self) -> bool {
        matches!(self, Self::Remove)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_quantities() {
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(9_999).unwrap().get(), 9_999);
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-3), Err(QuantityError::NotPositive(-3)));
    }

    #[test]
    fn test_too_large_rejected() {
        assert!(matches!(
            Quantity::new(10_000),
            Err(QuantityError::TooLarge { .. })
        ));
        assert!(matches!(
            Quantity::new(i64::MAX),
            Err(QuantityError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_change_non_positive_removes() {
        assert_eq!(QuantityChange::from_requested(0), Ok(QuantityChange::Remove));
        assert_eq!(QuantityChange::from_requested(-1), Ok(QuantityChange::Remove));
        assert!(QuantityChange::from_requested(0).unwrap().is_remove());
    }

    #[test]
    fn test_change_positive_sets() {
        assert_eq!(
            QuantityChange::from_requested(4),
            Ok(QuantityChange::Set(Quantity::new(4).unwrap()))
        );
    }

    #[test]
    fn test_serde() {
        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q.get(), 3);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::to_string(&q).unwrap(), "3");
    }
}
