//! Favorite entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::Product;

/// A favorited product and when it was favorited.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    /// The product.
    pub product: Product,
    /// When the identity favorited it.
    pub favorited_at: DateTime<Utc>,
}
