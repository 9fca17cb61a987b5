//! Admin catalog API route handlers.
//!
//! Every handler takes [`RequireAdmin`]: anonymous requests get 401, customers
//! without the admin flag get 403.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Serialize;
use tracing::instrument;

use litus_core::{CategoryId, ProductId};

use super::Ack;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, NewCategory, Product, ProductInput};
use crate::state::AppState;

/// Multipart field carrying the image file.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct CategoryCreated {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct ProductSaved {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct Deleted {}

/// POST /admin/api/categories
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NewCategory>,
) -> Result<Json<Ack<CategoryCreated>>> {
    let category = state.catalog().create_category(&body).await?;
    Ok(Json(Ack::ok("Category created", CategoryCreated { category })))
}

/// DELETE /admin/api/categories/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<Ack<Deleted>>> {
    state.catalog().delete_category(id).await?;
    Ok(Json(Ack::ok("Category deleted", Deleted {})))
}

/// POST /admin/api/products
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<ProductInput>,
) -> Result<Json<Ack<ProductSaved>>> {
    let product = state.catalog().create_product(&body).await?;
    Ok(Json(Ack::ok("Product created", ProductSaved { product })))
}

/// PUT /admin/api/products/{id}
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Ack<ProductSaved>>> {
    let product = state.catalog().update_product(id, &body).await?;
    Ok(Json(Ack::ok("Product updated", ProductSaved { product })))
}

/// DELETE /admin/api/products/{id}
///
/// Cart lines, favorites, and comments on the product are removed with it.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Ack<Deleted>>> {
    state.catalog().delete_product(id, state.media()).await?;
    Ok(Json(Ack::ok("Product deleted", Deleted {})))
}

/// POST /admin/api/products/{id}/image (multipart field `image`)
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<Ack<ProductSaved>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let product = state
            .catalog()
            .set_product_image(id, &file_name, &bytes, state.media())
            .await?;
        return Ok(Json(Ack::ok("Image uploaded", ProductSaved { product })));
    }

    Err(AppError::BadRequest(format!(
        "multipart field '{IMAGE_FIELD}' is required"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::tests::{send, test_app};

    #[tokio::test]
    async fn test_admin_requires_login() {
        let body = json!({ "name": "Elbise" });
        let (status, json) =
            send(test_app(true), "POST", "/admin/api/categories", Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);

        let (status, _) = send(test_app(true), "DELETE", "/admin/api/products/4", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
