//! Comment log: append-only product comments.

use sqlx::PgPool;
use tracing::instrument;

use litus_core::{Identity, ProductId};

use super::ShopError;
use crate::db::{CommentRepository, Replay, StoragePolicy};
use crate::models::Comment;

/// Longest accepted author name, in characters.
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Longest accepted comment body, in characters.
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// Comment operations.
pub struct CommentLog<'a> {
    pool: &'a PgPool,
    policy: StoragePolicy,
}

impl<'a> CommentLog<'a> {
    /// Create a comment log over a pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StoragePolicy) -> Self {
        Self { pool, policy }
    }

    /// Append a comment.
    ///
    /// Customer identities are recorded as the author; guests and anonymous
    /// requests are stored unattributed.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if the author or content is blank or
    /// too long, or `ShopError::NotFound` if the product does not exist.
    #[instrument(skip(self, author_name, content))]
    pub async fn append(
        &self,
        product_id: ProductId,
        author_name: &str,
        content: &str,
        identity: Option<Identity>,
    ) -> Result<Comment, ShopError> {
        let (author_name, content) = validate(author_name, content)?;
        let user_id = identity.and_then(|i| i.user_id());
        let pool = self.pool;

        let comment = self
            .policy
            .run("comments.append", Replay::AtMostOnce, move || async move {
                CommentRepository::new(pool)
                    .insert(product_id, user_id, author_name, content)
                    .await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product"))?;

        tracing::info!(comment_id = %comment.id, product_id = %product_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<Comment>, ShopError> {
        let pool = self.pool;
        Ok(self
            .policy
            .run("comments.list", Replay::Idempotent, move || async move {
                CommentRepository::new(pool).list_for_product(product_id).await
            })
            .await?)
    }
}

/// Trim and check both fields.
fn validate<'s>(author_name: &'s str, content: &'s str) -> Result<(&'s str, &'s str), ShopError> {
    let author_name = author_name.trim();
    let content = content.trim();
    if author_name.is_empty() || content.is_empty() {
        return Err(ShopError::Validation(
            "name and comment are required".to_owned(),
        ));
    }
    if author_name.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(ShopError::Validation(format!(
            "name must be at most {MAX_AUTHOR_LENGTH} characters"
        )));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ShopError::Validation(format!(
            "comment must be at most {MAX_CONTENT_LENGTH} characters"
        )));
    }
    Ok((author_name, content))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims() {
        let (author, content) = validate("  Deniz ", "\tGüzel ürün\n").unwrap();
        assert_eq!(author, "Deniz");
        assert_eq!(content, "Güzel ürün");
    }

    #[test]
    fn test_validate_rejects_blank() {
        assert!(matches!(validate("   ", "ok"), Err(ShopError::Validation(_))));
        assert!(matches!(validate("Deniz", " \n "), Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let author = "ş".repeat(MAX_AUTHOR_LENGTH);
        assert!(validate(&author, "ok").is_ok());
        let author = "ş".repeat(MAX_AUTHOR_LENGTH + 1);
        assert!(validate(&author, "ok").is_err());
        assert!(validate("a", &"x".repeat(MAX_CONTENT_LENGTH + 1)).is_err());
    }
}
