//! Cart totals.
//!
//! Totals are always recomputed from the product's current price; nothing is
//! snapshotted when a line is added. A price change therefore shows up in every
//! cart that holds the product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::Price;
use super::quantity::Quantity;

/// Monetary value of one cart line.
#[must_use]
pub fn line_total(price: Price, quantity: Quantity) -> Decimal {
    price.amount() * Decimal::from(quantity.get())
}

/// Aggregate view of an identity's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartSummary {
    /// Number of distinct lines (not units).
    pub line_count: i64,
    /// Total number of units across all lines.
    pub unit_count: i64,
    /// Sum of price x quantity over all lines.
    pub total: Decimal,
}

impl CartSummary {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            line_count: 0,
            unit_count: 0,
            total: Decimal::ZERO,
        }
    }

    /// Summarize a set of `(unit price, quantity)` lines.
    #[must_use]
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Price, Quantity)>,
    {
        lines
            .into_iter()
            .fold(Self::empty(), |mut summary, (price, quantity)| {
                summary.line_count += 1;
                summary.unit_count += i64::from(quantity.get());
                summary.total += line_total(price, quantity);
                summary
            })
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.line_count == 0
    }
}
