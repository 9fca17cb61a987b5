//! Favorites set: per-identity product set with toggle semantics.

use sqlx::PgPool;
use tracing::instrument;

use litus_core::{Identity, ProductId};

use super::ShopError;
use crate::db::{FavoriteRepository, Replay, StoragePolicy};
use crate::models::Favorite;

/// Favorites operations.
pub struct FavoritesSet<'a> {
    pool: &'a PgPool,
    policy: StoragePolicy,
}

impl<'a> FavoritesSet<'a> {
    /// Create a favorites set over a pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StoragePolicy) -> Self {
        Self { pool, policy }
    }

    /// Flip the product's presence; returns whether it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn toggle(&self, identity: Identity, product_id: ProductId) -> Result<bool, ShopError> {
        let pool = self.pool;
        let is_favorite = self
            .policy
            .run("favorites.toggle", Replay::AtMostOnce, move || async move {
                FavoriteRepository::new(pool).toggle(identity, product_id).await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product"))?;

        tracing::info!(product_id = %product_id, is_favorite, "Toggled favorite");
        Ok(is_favorite)
    }

    /// Favorited products, newest favorite first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn list(&self, identity: Identity) -> Result<Vec<Favorite>, ShopError> {
        let pool = self.pool;
        Ok(self
            .policy
            .run("favorites.list", Replay::Idempotent, move || async move {
                FavoriteRepository::new(pool).list(identity).await
            })
            .await?)
    }

    /// Whether the identity has favorited the product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn contains(
        &self,
        identity: Identity,
        product_id: ProductId,
    ) -> Result<bool, ShopError> {
        let pool = self.pool;
        Ok(self
            .policy
            .run("favorites.contains", Replay::Idempotent, move || async move {
                FavoriteRepository::new(pool)
                    .contains(identity, product_id)
                    .await
            })
            .await?)
    }
}
