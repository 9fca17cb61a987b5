//! Catalog and comment route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use litus_core::{CategoryId, ProductId};

use super::Ack;
use crate::error::{AppError, Result};
use crate::middleware::KnownIdentity;
use crate::models::{Category, Comment, Product, ProductFilter};
use crate::services::{HOME_SECTION_LIMIT, HomePage};
use crate::state::AppState;

// =============================================================================
// Query / Body Types
// =============================================================================

/// Product listing query. Blank values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductsQuery {
    fn into_filter(self) -> Result<ProductFilter> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(CategoryId::new(raw.parse::<i32>().map_err(|_| {
                AppError::BadRequest(format!("invalid category id: {raw}"))
            })?)),
        };
        Ok(ProductFilter {
            category,
            search: self.search,
        })
    }
}

/// New comment body.
#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub product_id: ProductId,
    pub author_name: String,
    pub content: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub comments: Vec<Comment>,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeCount {
    pub likes: i32,
}

#[derive(Debug, Serialize)]
pub struct CreatedComment {
    pub comment: Comment,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/home
pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    Ok(Json(state.catalog().home(HOME_SECTION_LIMIT).await?))
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Result<Json<Arc<Vec<Category>>>> {
    Ok(Json(state.catalog().list_categories().await?))
}

/// GET /api/products?category=&search=
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.catalog().list_products(&filter).await?))
}

/// GET /api/products/{slug}
///
/// The favorite flag uses the request's existing identity; viewing a product
/// never mints a guest token.
#[instrument(skip(state, identity))]
pub async fn product_detail(
    State(state): State<AppState>,
    KnownIdentity(identity): KnownIdentity,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = state.catalog().product_by_slug(&slug).await?;
    let comments = state.comments().list_for_product(product.id).await?;
    let is_favorite = match identity {
        Some(identity) => state.favorites().contains(identity, product.id).await?,
        None => false,
    };

    Ok(Json(ProductDetail {
        product,
        comments,
        is_favorite,
    }))
}

/// POST /api/products/{id}/like
#[instrument(skip(state))]
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Ack<LikeCount>>> {
    let likes = state.catalog().like(id).await?;
    Ok(Json(Ack::ok("Thanks for the like", LikeCount { likes })))
}

/// GET /api/products/{id}/comments
pub async fn comments(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Comment>>> {
    // Unknown products answer 404 rather than an empty list
    state.catalog().product(id).await?;
    Ok(Json(state.comments().list_for_product(id).await?))
}

/// POST /api/comments
///
/// Logged-in customers are recorded as the author; guests post unattributed.
#[instrument(skip(state, identity, body), fields(product_id = %body.product_id))]
pub async fn add_comment(
    State(state): State<AppState>,
    KnownIdentity(identity): KnownIdentity,
    Json(body): Json<NewComment>,
) -> Result<Json<Ack<CreatedComment>>> {
    let comment = state
        .comments()
        .append(body.product_id, &body.author_name, &body.content, identity)
        .await?;
    Ok(Json(Ack::ok("Comment added", CreatedComment { comment })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::tests::{send, test_app};

    #[test]
    fn test_products_query_blank_category() {
        let filter = ProductsQuery {
            category: Some("  ".to_string()),
            search: Some("elbise".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.search_term(), Some("elbise"));
    }

    #[test]
    fn test_products_query_bad_category() {
        let result = ProductsQuery {
            category: Some("shoes".to_string()),
            search: None,
        }
        .into_filter();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_products_rejects_bad_category() {
        let (status, json) =
            send(test_app(true), "GET", "/api/products?category=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_blank_comment_rejected_before_storage() {
        let body = json!({ "product_id": 1, "author_name": "   ", "content": "Harika" });
        let (status, json) = send(test_app(true), "POST", "/api/comments", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "name and comment are required");
    }
}
