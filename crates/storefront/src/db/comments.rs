//! Comment log repository. Comments are append-only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use litus_core::{CommentId, ProductId, UserId};

use super::{RepositoryError, classify_write_error};
use crate::models::Comment;

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i32,
    product_id: i32,
    user_id: Option<i32>,
    author_name: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: row.user_id.map(UserId::new),
            author_name: row.author_name,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a comment. `created_at` is assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn insert(
        &self,
        product_id: ProductId,
        user_id: Option<UserId>,
        author_name: &str,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO shop.comment (product_id, user_id, author_name, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, author_name, content, created_at
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(author_name)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "comment already exists"))?;
        Ok(row.into())
    }

    /// Comments on a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, product_id, user_id, author_name, content, created_at
            FROM shop.comment
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
