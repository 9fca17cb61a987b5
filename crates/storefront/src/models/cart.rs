//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use litus_core::{CartLineId, CartSummary, Price, ProductId, Quantity, Slug, line_total};

/// One cart line joined with the product's current data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Product on this line.
    pub product_id: ProductId,
    /// Product display name.
    pub product_name: String,
    /// Product slug.
    pub product_slug: Slug,
    /// Product image file name.
    pub image_path: Option<String>,
    /// Current unit price of the product.
    pub unit_price: Price,
    /// Units on this line.
    pub quantity: Quantity,
    /// `unit_price * quantity`.
    pub line_total: Decimal,
    /// When the line was first added.
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Build a line, computing its total from the live price.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: CartLineId,
        product_id: ProductId,
        product_name: String,
        product_slug: Slug,
        image_path: Option<String>,
        unit_price: Price,
        quantity: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            product_name,
            product_slug,
            image_path,
            unit_price,
            quantity,
            line_total: line_total(unit_price, quantity),
            created_at,
        }
    }
}

/// A full cart: lines in insertion order plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    /// Lines ordered by creation.
    pub lines: Vec<CartLine>,
    /// Totals over `lines`.
    pub summary: CartSummary,
}

impl CartView {
    /// Build a view, recomputing the summary from the lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let summary = CartSummary::from_lines(lines.iter().map(|l| (l.unit_price, l.quantity)));
        Self { lines, summary }
    }
}
