//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Database + schema shape check
//!
//! # Catalog
//! GET  /api/home                       - Featured + newest products, categories
//! GET  /api/categories                 - Category list
//! GET  /api/products?category=&search= - Product listing
//! GET  /api/products/{slug}            - Product detail with comments and favorite flag
//! POST /api/products/{id}/like         - Increment like counter
//! GET  /api/products/{id}/comments     - Comments, newest first
//! POST /api/comments                   - Add a comment
//!
//! # Cart (owned by the resolved identity)
//! GET  /api/cart                       - Lines + summary
//! POST /api/cart/add                   - Add or merge a line
//! POST /api/cart/update                - Set quantity (<= 0 removes)
//! POST /api/cart/remove                - Remove a line
//! GET  /api/cart/count                 - Line count badge
//!
//! # Favorites
//! GET  /api/favorites                  - Favorited products
//! POST /api/favorites/toggle           - Flip a product's presence
//!
//! # Auth
//! POST /api/auth/register              - Create account and log in
//! POST /api/auth/login                 - Log in
//! POST /api/auth/logout                - Log out (guest token survives)
//! GET  /api/auth/me                    - Current identity
//!
//! POST /api/contact                    - Contact form
//!
//! # Admin (requires an admin customer)
//! POST   /admin/api/categories         - Create category
//! DELETE /admin/api/categories/{id}    - Delete category
//! POST   /admin/api/products           - Create product
//! PUT    /admin/api/products/{id}      - Update product
//! DELETE /admin/api/products/{id}      - Delete product
//! POST   /admin/api/products/{id}/image - Upload product image (multipart `image`)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod favorites;
pub mod health;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::services::media::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Multipart framing allowance on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Body shared by mutation responses: `{"success": true, "message": ...}`
/// with endpoint-specific counters flattened alongside.
#[derive(Debug, Serialize)]
pub struct Ack<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Ack<T> {
    /// A successful response.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Create the health routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::ready))
}

/// Create the catalog and comment routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(catalog::home))
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        // One parameter name per segment: `{product}` is a slug for detail, an ID otherwise
        .route("/products/{product}", get(catalog::product_detail))
        .route("/products/{product}/like", post(catalog::like))
        .route("/products/{product}/comments", get(catalog::comments))
        .route("/comments", post(catalog::add_comment))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/toggle", post(favorites::toggle))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the admin API routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(admin::create_category))
        .route("/categories/{id}", axum::routing::delete(admin::delete_category))
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/products/{id}/image",
            post(admin::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
}

/// Create all routes for the storefront.
///
/// Session, tracing, and static file layers are added by the binary.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/favorites", favorites_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/contact", post(contact::submit))
        .nest("/admin/api", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    //! Router tests against a lazy pool and an in-memory session store.
    //! Every request here must be answered before storage is touched.

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::config::{StorefrontConfig, TEST_SESSION_SECRET};

    pub(crate) fn test_app(allow_guests: bool) -> Router {
        let guests = if allow_guests { "true" } else { "false" };
        let config = StorefrontConfig::from_lookup(|key| {
            match key {
                "STOREFRONT_DATABASE_URL" => Some("postgres://localhost:1/unused"),
                "STOREFRONT_BASE_URL" => Some("http://localhost:3000"),
                "STOREFRONT_SESSION_SECRET" => Some(TEST_SESSION_SECRET),
                "STOREFRONT_ALLOW_GUESTS" => Some(guests),
                "STOREFRONT_DB_TIMEOUT_MS" => Some("200"),
                "STOREFRONT_DB_MAX_RETRIES" => Some("0"),
                _ => None,
            }
            .map(String::from)
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(100))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let state = AppState::new(config, pool);

        routes()
            .layer(SessionManagerLayer::new(MemoryStore::default()))
            .with_state(state)
    }

    pub(crate) async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let (status, json) = send(test_app(true), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(test_app(true), "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ack_flattens_counters() {
        #[derive(Serialize)]
        struct Count {
            cart_count: i64,
        }
        let json = serde_json::to_value(Ack::ok("Added to cart", Count { cart_count: 2 })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Added to cart");
        assert_eq!(json["cart_count"], 2);
    }
}
