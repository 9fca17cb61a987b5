//! Favorites route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use litus_core::ProductId;

use super::Ack;
use crate::error::Result;
use crate::middleware::ResolvedIdentity;
use crate::models::Favorite;
use crate::state::AppState;

/// Toggle body.
#[derive(Debug, Deserialize)]
pub struct ToggleFavorite {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub is_favorite: bool,
}

/// GET /api/favorites
pub async fn index(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
) -> Result<Json<Vec<Favorite>>> {
    Ok(Json(state.favorites().list(identity).await?))
}

/// POST /api/favorites/toggle
#[instrument(skip(state, identity))]
pub async fn toggle(
    State(state): State<AppState>,
    ResolvedIdentity(identity): ResolvedIdentity,
    Json(body): Json<ToggleFavorite>,
) -> Result<Json<Ack<FavoriteState>>> {
    let is_favorite = state.favorites().toggle(identity, body.product_id).await?;
    let message = if is_favorite {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(Json(Ack::ok(message, FavoriteState { is_favorite })))
}
