//! Cart ledger: per-identity product lines.
//!
//! Adding a product already in the cart merges into its line. Setting a
//! line's quantity to zero or below removes it. Lines are only ever touched
//! through statements filtered by the owning identity, and totals always use
//! the product's current price.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use litus_core::{CartLineId, CartSummary, Identity, ProductId, Quantity, QuantityChange};

use super::ShopError;
use crate::db::cart::LineOwnership;
use crate::db::{CartRepository, Replay, StoragePolicy};
use crate::models::{CartLine, CartView};

/// Result of changing or removing a line.
#[derive(Debug, Clone, Serialize)]
pub struct LineChange {
    /// The line after the change; `None` if it was removed.
    pub line: Option<CartLine>,
    /// Total of the changed line (zero when removed).
    pub item_total: Decimal,
    /// Cart totals after the change.
    pub summary: CartSummary,
}

/// Cart operations for one identity at a time.
pub struct CartLedger<'a> {
    pool: &'a PgPool,
    policy: StoragePolicy,
}

impl<'a> CartLedger<'a> {
    /// Create a cart ledger over a pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StoragePolicy) -> Self {
        Self { pool, policy }
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// Returns the identity's number of distinct lines afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if `quantity` is below 1 or too large,
    /// or `ShopError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        identity: Identity,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<i64, ShopError> {
        let quantity = Quantity::new(quantity).map_err(|e| ShopError::Validation(e.to_string()))?;
        let pool = self.pool;

        self.policy
            .run("cart.add_line", Replay::AtMostOnce, move || async move {
                CartRepository::new(pool)
                    .upsert_line(identity, product_id, quantity)
                    .await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product"))?;

        tracing::info!(product_id = %product_id, quantity = %quantity, "Added to cart");
        Ok(self.summary(identity).await?.line_count)
    }

    /// Apply a requested quantity to a line: positive sets it, zero or below
    /// removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the line does not exist,
    /// `ShopError::NotOwner` if it belongs to another identity, or
    /// `ShopError::Validation` if the quantity is too large.
    #[instrument(skip(self))]
    pub async fn update_line(
        &self,
        identity: Identity,
        line_id: CartLineId,
        requested: i64,
    ) -> Result<LineChange, ShopError> {
        let change = QuantityChange::from_requested(requested)
            .map_err(|e| ShopError::Validation(e.to_string()))?;
        self.set_quantity_or_remove(identity, line_id, change).await
    }

    /// Set an owned line's quantity or remove it.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the line does not exist, or
    /// `ShopError::NotOwner` if it belongs to another identity.
    pub async fn set_quantity_or_remove(
        &self,
        identity: Identity,
        line_id: CartLineId,
        change: QuantityChange,
    ) -> Result<LineChange, ShopError> {
        self.check_owner(identity, line_id).await?;
        let pool = self.pool;

        let line = match change {
            QuantityChange::Set(quantity) => {
                let updated = self
                    .policy
                    .run("cart.set_quantity", Replay::Idempotent, move || async move {
                        CartRepository::new(pool)
                            .set_quantity(identity, line_id, quantity)
                            .await
                    })
                    .await?;
                if !updated {
                    // Removed concurrently after the ownership check
                    return Err(ShopError::NotFound("cart line"));
                }
                self.policy
                    .run("cart.get_line", Replay::Idempotent, move || async move {
                        CartRepository::new(pool).get_line(identity, line_id).await
                    })
                    .await?
            }
            QuantityChange::Remove => {
                self.delete_owned(identity, line_id).await?;
                None
            }
        };

        let summary = self.summary(identity).await?;
        Ok(LineChange {
            item_total: line.as_ref().map_or(Decimal::ZERO, |l| l.line_total),
            line,
            summary,
        })
    }

    /// Remove an owned line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the line does not exist, or
    /// `ShopError::NotOwner` if it belongs to another identity.
    #[instrument(skip(self))]
    pub async fn remove_line(
        &self,
        identity: Identity,
        line_id: CartLineId,
    ) -> Result<CartSummary, ShopError> {
        self.check_owner(identity, line_id).await?;
        self.delete_owned(identity, line_id).await?;
        self.summary(identity).await
    }

    /// All lines with live prices, oldest first, plus totals.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn list_lines(&self, identity: Identity) -> Result<CartView, ShopError> {
        let pool = self.pool;
        let lines = self
            .policy
            .run("cart.list_lines", Replay::Idempotent, move || async move {
                CartRepository::new(pool).list_lines(identity).await
            })
            .await?;
        Ok(CartView::from_lines(lines))
    }

    /// Line count and total value.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn summary(&self, identity: Identity) -> Result<CartSummary, ShopError> {
        let pool = self.pool;
        Ok(self
            .policy
            .run("cart.summary", Replay::Idempotent, move || async move {
                CartRepository::new(pool).summary(identity).await
            })
            .await?)
    }

    async fn check_owner(&self, identity: Identity, line_id: CartLineId) -> Result<(), ShopError> {
        let pool = self.pool;
        let ownership = self
            .policy
            .run("cart.ownership", Replay::Idempotent, move || async move {
                CartRepository::new(pool).ownership(identity, line_id).await
            })
            .await?;
        match ownership {
            LineOwnership::Owned => Ok(()),
            LineOwnership::Missing => Err(ShopError::NotFound("cart line")),
            LineOwnership::Foreign => {
                tracing::warn!(line_id = %line_id, "Cart line belongs to another identity");
                Err(ShopError::NotOwner)
            }
        }
    }

    async fn delete_owned(&self, identity: Identity, line_id: CartLineId) -> Result<(), ShopError> {
        let pool = self.pool;
        let deleted = self
            .policy
            .run("cart.delete_line", Replay::Idempotent, move || async move {
                CartRepository::new(pool).delete_line(identity, line_id).await
            })
            .await?;
        if !deleted {
            tracing::debug!(line_id = %line_id, "Cart line already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    use litus_core::GuestToken;

    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_line_rejects_non_positive_quantity_before_storage() {
        let pool = lazy_pool();
        let ledger = CartLedger::new(&pool, StoragePolicy::default());
        let identity = Identity::guest(GuestToken::mint());

        for quantity in [0, -1] {
            let result = ledger.add_line(identity, ProductId::new(1), quantity).await;
            assert!(matches!(result, Err(ShopError::Validation(_))), "{quantity}");
        }
    }

    #[tokio::test]
    async fn test_update_line_rejects_oversized_quantity() {
        let pool = lazy_pool();
        let ledger = CartLedger::new(&pool, StoragePolicy::default());
        let identity = Identity::guest(GuestToken::mint());

        let result = ledger
            .update_line(identity, CartLineId::new(1), i64::from(Quantity::MAX) + 1)
            .await;
        assert!(matches!(result, Err(ShopError::Validation(_))));
    }
}
