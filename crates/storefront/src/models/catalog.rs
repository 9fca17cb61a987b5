//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use litus_core::{CategoryId, Price, ProductId, Slug};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: Slug,
}

/// A catalog product with its category name.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: Slug,
    /// Current unit price.
    pub price: Price,
    /// Optional long description.
    pub description: Option<String>,
    /// Units in stock (informational, never reserved).
    pub stock: i32,
    /// Stored image file name, relative to the upload directory.
    pub image_path: Option<String>,
    /// Owning category.
    pub category_id: CategoryId,
    /// Owning category's display name.
    pub category_name: String,
    /// Like counter.
    pub likes: i32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Restrict to one category.
    pub category: Option<CategoryId>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl ProductFilter {
    /// The search term, trimmed, or `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    /// Display name.
    pub name: String,
    /// URL slug; derived from the name when omitted.
    pub slug: Option<String>,
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    /// Display name.
    pub name: String,
    /// URL slug; derived from the name when omitted.
    pub slug: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Units in stock.
    #[serde(default)]
    pub stock: i32,
    /// Owning category.
    pub category_id: CategoryId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_trims_blank() {
        let filter = ProductFilter {
            category: None,
            search: Some("   ".to_owned()),
        };
        assert_eq!(filter.search_term(), None);

        let filter = ProductFilter {
            category: None,
            search: Some(" elbise ".to_owned()),
        };
        assert_eq!(filter.search_term(), Some("elbise"));
    }

    #[test]
    fn test_product_input_rejects_negative_price() {
        let json = r#"{"name":"X","price":"-1.00","category_id":1}"#;
        assert!(serde_json::from_str::<ProductInput>(json).is_err());

        let json = r#"{"name":"X","price":"12.50","category_id":1}"#;
        let input: ProductInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.stock, 0);
        assert_eq!(input.price.to_string(), "12.50");
    }
}
