//! Product comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use litus_core::{CommentId, ProductId, UserId};

/// An append-only product comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// Comment ID.
    pub id: CommentId,
    /// Commented product.
    pub product_id: ProductId,
    /// Customer who wrote it; `None` for guests.
    pub user_id: Option<UserId>,
    /// Display name given by the author.
    pub author_name: String,
    /// Comment body.
    pub content: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}
