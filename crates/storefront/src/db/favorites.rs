//! Favorites repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use litus_core::{Identity, ProductId};

use super::catalog::ProductRow;
use super::{OWNER_MATCHES, RepositoryError, classify_write_error};
use crate::models::{Favorite, Product};

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    #[sqlx(flatten)]
    product: ProductRow,
    favorited_at: DateTime<Utc>,
}

/// Repository for favorite database operations.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorites repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Flip a product's presence in the identity's favorites.
    ///
    /// Returns `true` if the product is a favorite afterwards. The delete and
    /// the insert run in one transaction; the insert ignores a concurrent
    /// duplicate, so the unique key is never violated. When that happens the
    /// row is removed again, so every call flips presence even under races.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle(
        &self,
        identity: Identity,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&format!(
            "DELETE FROM shop.favorite WHERE product_id = $3 AND {OWNER_MATCHES}"
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(product_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed > 0 {
            tx.commit().await?;
            return Ok(false);
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO shop.favorite (user_id, guest_token, product_id)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT favorite_owner_product_key DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .bind(product_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_error(e, "favorite already exists"))?
        .rows_affected();

        if inserted > 0 {
            tx.commit().await?;
            return Ok(true);
        }

        // A concurrent toggle inserted the row first; this call flips it back
        sqlx::query(&format!(
            "DELETE FROM shop.favorite WHERE product_id = $3 AND {OWNER_MATCHES}"
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(false)
    }

    /// Whether the identity has favorited a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        identity: Identity,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM shop.favorite WHERE product_id = $3 AND {OWNER_MATCHES})"
        ))
        .bind(user_id)
        .bind(guest_token)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// The identity's favorites, most recently favorited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, identity: Identity) -> Result<Vec<Favorite>, RepositoryError> {
        let (user_id, guest_token) = identity.owner_columns();
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT p.id, p.name, p.slug, p.price, p.description, p.stock, p.image_path,
                   p.category_id, c.name AS category_name, p.likes, p.created_at,
                   f.created_at AS favorited_at
            FROM shop.favorite f
            JOIN shop.product p ON p.id = f.product_id
            JOIN shop.category c ON c.id = p.category_id
            WHERE (f.user_id = $1 OR f.guest_token = $2)
            ORDER BY f.created_at DESC, f.id DESC
            ",
        )
        .bind(user_id)
        .bind(guest_token)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Favorite {
                    product: Product::try_from(row.product)?,
                    favorited_at: row.favorited_at,
                })
            })
            .collect()
    }
}
