//! Cart line repository.
//!
//! Every statement is scoped to one owner through [`OWNER_MATCHES`], binding
//! the identity's `(user_id, guest_token)` pair as `$1, $2`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use litus_core::{CartLineId, CartSummary, Identity, Price, ProductId, Quantity, Slug};

use super::{OWNER_MATCHES, RepositoryError, classify_write_error};
use crate::models::CartLine;

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    product_id: i32,
    product_name: String,
    product_slug: String,
    image_path: Option<String>,
    unit_price: Price,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.product_slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product slug in database: {e}"))
        })?;
        let quantity = Quantity::new(i64::from(row.quantity)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart quantity in database: {e}"))
        })?;
        Ok(Self::new(
            CartLineId::new(row.id),
            ProductId::new(row.product_id),
            row.product_name,
            slug,
            row.image_path,
            row.unit_price,
            quantity,
            row.created_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    line_count: i64,
    unit_count: i64,
    total: Decimal,
}

impl From<SummaryRow> for CartSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            line_count: row.line_count,
            unit_count: row.unit_count,
            total: row.total,
        }
    }
}

/// Who owns a cart line, as seen by the requesting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOwnership {
    /// No line with that ID exists.
    Missing,
    /// The line belongs to the requesting identity.
    Owned,
    /// The line belongs to another identity.
    Foreign,
}

/// Repository for cart line database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a line or add to the existing line for the same product.
    ///
    /// Runs as one upsert on the `(owner, product)` unique key, so concurrent
    /// adds of the same product always merge into a single line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn upsert_line(
        &self,
        identity: Identity,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        sqlx::query(
            r"
            INSERT INTO shop.cart_line (user_id, guest_token, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT cart_line_owner_product_key
            DO UPDATE SET quantity = LEAST(cart_line.quantity + EXCLUDED.quantity, $5),
                          updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .bind(product_id)
        .bind(quantity.get())
        .bind(Quantity::MAX)
        .execute(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "cart line already exists"))?;
        Ok(())
    }

    /// Classify a line ID relative to the requesting identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ownership(
        &self,
        identity: Identity,
        line_id: CartLineId,
    ) -> Result<LineOwnership, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let owned: Option<bool> = sqlx::query_scalar(&format!(
            "SELECT {OWNER_MATCHES} IS TRUE FROM shop.cart_line WHERE id = $3"
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(line_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(match owned {
            None => LineOwnership::Missing,
            Some(true) => LineOwnership::Owned,
            Some(false) => LineOwnership::Foreign,
        })
    }

    /// Set an owned line's quantity. Returns `false` if no owned line matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        identity: Identity,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<bool, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let result = sqlx::query(&format!(
            r"
            UPDATE shop.cart_line
            SET quantity = $4, updated_at = NOW()
            WHERE id = $3 AND {OWNER_MATCHES}
            "
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(line_id)
        .bind(quantity.get())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an owned line. Returns `false` if no owned line matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_line(
        &self,
        identity: Identity,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let result = sqlx::query(&format!(
            "DELETE FROM shop.cart_line WHERE id = $3 AND {OWNER_MATCHES}"
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(line_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// An owned line joined with its product's live data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_line(
        &self,
        identity: Identity,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT l.id, l.product_id, p.name AS product_name, p.slug AS product_slug,
                   p.image_path, p.price AS unit_price, l.quantity, l.created_at
            FROM shop.cart_line l
            JOIN shop.product p ON p.id = l.product_id
            WHERE l.id = $3 AND {}
            ",
            qualified_owner("l")
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(line_id)
        .fetch_optional(self.pool)
        .await?
        .map(CartLine::try_from)
        .transpose()
    }

    /// All lines for an identity, oldest first, priced at the live price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lines(&self, identity: Identity) -> Result<Vec<CartLine>, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT l.id, l.product_id, p.name AS product_name, p.slug AS product_slug,
                   p.image_path, p.price AS unit_price, l.quantity, l.created_at
            FROM shop.cart_line l
            JOIN shop.product p ON p.id = l.product_id
            WHERE {}
            ORDER BY l.created_at, l.id
            ",
            qualified_owner("l")
        ))
        .bind(user_id)
        .bind(guest_token)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Line count, unit count, and live-price total for an identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, identity: Identity) -> Result<CartSummary, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            r"
            SELECT COUNT(l.id) AS line_count,
                   COALESCE(SUM(l.quantity), 0)::INT8 AS unit_count,
                   COALESCE(SUM(p.price * l.quantity), 0)::NUMERIC AS total
            FROM shop.cart_line l
            JOIN shop.product p ON p.id = l.product_id
            WHERE {}
            ",
            qualified_owner("l")
        ))
        .bind(user_id)
        .bind(guest_token)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }
}

/// [`OWNER_MATCHES`] with the columns qualified by a table alias.
fn qualified_owner(alias: &str) -> String {
    format!("({alias}.user_id = $1 OR {alias}.guest_token = $2)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_owner_matches_unqualified_shape() {
        assert_eq!(
            qualified_owner("l"),
            "(l.user_id = $1 OR l.guest_token = $2)"
        );
        assert_eq!(
            OWNER_MATCHES.replace("user_id", "l.user_id").replace("guest_token", "l.guest_token"),
            qualified_owner("l")
        );
    }
}
