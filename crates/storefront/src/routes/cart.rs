//! Cart route handlers.
//!
//! Every handler works on the cart of the request's resolved identity: the
//! logged-in customer, or the session's guest token (minted on first use).

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use litus_core::{CartLineId, ProductId};

use super::Ack;
use crate::error::Result;
use crate::middleware::ResolvedIdentity;
use crate::models::{CartLine, CartView};
use crate::state::AppState;

const fn default_quantity() -> i64 {
    1
}

/// Add to cart body.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Update cart line body. A quantity of zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartLine {
    pub line_id: CartLineId,
    pub quantity: i64,
}

/// Remove cart line body.
#[derive(Debug, Deserialize)]
pub struct RemoveCartLine {
    pub line_id: CartLineId,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub cart_count: i64,
}

#[derive(Debug, Serialize)]
pub struct LineUpdated {
    pub line: Option<CartLine>,
    pub item_total: Decimal,
    pub total: Decimal,
    pub cart_count: i64,
}

#[derive(Debug, Serialize)]
pub struct LineRemoved {
    pub cart_count: i64,
    pub total: Decimal,
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<Json<CartView>> {
    Ok(Json(state.cart().list_lines(identity).await?))
}

/// POST /api/cart/add
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(body): Json<AddToCart>,
) -> Result<Json<Ack<CartCount>>> {
    let cart_count = state
        .cart()
        .add_line(identity, body.product_id, body.quantity)
        .await?;
    Ok(Json(Ack::ok("Added to cart", CartCount { cart_count })))
}

/// POST /api/cart/update
#[instrument(skip(state, identity))]
pub async fn update(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(body): Json<UpdateCartLine>,
) -> Result<Json<Ack<LineUpdated>>> {
    let change = state
        .cart()
        .update_line(identity, body.line_id, body.quantity)
        .await?;
    let message = if change.line.is_some() {
        "Cart updated"
    } else {
        "Item removed from cart"
    };

    Ok(Json(Ack::ok(
        message,
        LineUpdated {
            line: change.line,
            item_total: change.item_total,
            total: change.summary.total,
            cart_count: change.summary.line_count,
        },
    )))
}

/// POST /api/cart/remove
#[instrument(skip(state, identity))]
pub async fn remove(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(body): Json<RemoveCartLine>,
) -> Result<Json<Ack<LineRemoved>>> {
    let summary = state.cart().remove_line(identity, body.line_id).await?;
    Ok(Json(Ack::ok(
        "Item removed from cart",
        LineRemoved {
            cart_count: summary.line_count,
            total: summary.total,
        },
    )))
}

/// GET /api/cart/count
pub async fn count(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<Json<CartCount>> {
    let summary = state.cart().summary(identity).await?;
    Ok(Json(CartCount {
        cart_count: summary.line_count,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::tests::{send, test_app};

    #[test]
    fn test_add_defaults_to_one() {
        let body: AddToCart = serde_json::from_value(json!({ "product_id": 7 })).unwrap();
        assert_eq!(body.quantity, 1);
        assert_eq!(body.product_id, ProductId::new(7));
    }

    #[tokio::test]
    async fn test_add_zero_quantity_is_validation_error() {
        let body = json!({ "product_id": 1, "quantity": 0 });
        let (status, json) = send(test_app(true), "POST", "/api/cart/add", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_guests_disallowed_cart_is_unauthenticated() {
        let (status, json) = send(test_app(false), "GET", "/api/cart", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "login required");

        let body = json!({ "product_id": 1, "quantity": 2 });
        let (status, _) = send(test_app(false), "POST", "/api/cart/add", Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
