//! Integration tests for catalog reads and admin catalog management.
//!
//! Requires a `PostgreSQL` database at `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p litus-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use litus_core::Identity;
use litus_integration_tests::{TestContext, guest, price};
use litus_storefront::models::{NewCategory, ProductFilter, ProductInput};
use litus_storefront::services::{
    AuthError, AuthService, CartLedger, CommentLog, FavoritesSet, MediaStore, ShopError,
};

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_filter_by_category_and_search() {
    let ctx = TestContext::new().await;
    let category = ctx.category().await;
    let other = ctx.category().await;
    let first = ctx.product(&category, 1_000).await;
    ctx.product(&other, 1_000).await;

    let in_category = ctx
        .catalog()
        .list_products(&ProductFilter {
            category: Some(category.id),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(in_category.len(), 1);
    assert_eq!(in_category[0].id, first.id);

    let found = ctx
        .catalog()
        .list_products(&ProductFilter {
            category: None,
            search: Some(first.name.to_uppercase()),
        })
        .await
        .unwrap();
    assert!(found.iter().any(|p| p.id == first.id));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_like_increments() {
    let ctx = TestContext::new().await;
    let category = ctx.category().await;
    let product = ctx.product(&category, 1_000).await;

    assert_eq!(ctx.catalog().like(product.id).await.unwrap(), 1);
    assert_eq!(ctx.catalog().like(product.id).await.unwrap(), 2);
    assert_eq!(
        ctx.catalog().product_by_slug(product.slug.as_str()).await.unwrap().likes,
        2
    );
}

// ============================================================================
// Admin Catalog Management
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_duplicate_category_slug_conflicts() {
    let ctx = TestContext::new().await;
    let category = ctx.category().await;

    let err = ctx
        .catalog()
        .create_category(&NewCategory {
            name: "Another".to_owned(),
            slug: Some(category.slug.to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_with_products_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let category = ctx.category().await;
    let product = ctx.product(&category, 1_000).await;
    let media = MediaStore::new(std::env::temp_dir());

    let err = ctx.catalog().delete_category(category.id).await.unwrap_err();
    assert!(matches!(err, ShopError::ReferentialConflict(_)));

    ctx.catalog().delete_product(product.id, &media).await.unwrap();
    ctx.catalog().delete_category(category.id).await.unwrap();

    let err = ctx.catalog().delete_category(category.id).await.unwrap_err();
    assert!(matches!(err, ShopError::NotFound(_)));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_product_delete_cascades() {
    let ctx = TestContext::new().await;
    let category = ctx.category().await;
    let product = ctx.product(&category, 1_000).await;
    let media = MediaStore::new(std::env::temp_dir());
    let shopper = guest();
    let cart = CartLedger::new(&ctx.pool, ctx.policy);
    let favorites = FavoritesSet::new(&ctx.pool, ctx.policy);
    let comments = CommentLog::new(&ctx.pool, ctx.policy);

    cart.add_line(shopper, product.id, 2).await.unwrap();
    favorites.toggle(shopper, product.id).await.unwrap();
    comments
        .append(product.id, "Deniz", "Güzel", Some(shopper))
        .await
        .unwrap();

    ctx.catalog().delete_product(product.id, &media).await.unwrap();

    assert_eq!(cart.summary(shopper).await.unwrap().line_count, 0);
    assert!(favorites.list(shopper).await.unwrap().is_empty());
    assert!(comments.list_for_product(product.id).await.unwrap().is_empty());
    let err = ctx.catalog().product(product.id).await.unwrap_err();
    assert!(matches!(err, ShopError::NotFound(_)));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_create_product_in_missing_category_is_not_found() {
    let ctx = TestContext::new().await;

    let err = ctx
        .catalog()
        .create_product(&ProductInput {
            name: "Orphan".to_owned(),
            slug: None,
            price: price(1_000),
            description: None,
            stock: 1,
            category_id: litus_core::CategoryId::new(i32::MAX),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::NotFound(_)));
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_register_login_and_promote() {
    let ctx = TestContext::new().await;
    let auth = AuthService::new(&ctx.pool, ctx.policy);
    let customer = ctx.customer().await;
    assert!(!customer.is_admin);

    let err = auth
        .register(customer.username.as_str(), "another-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists));

    let err = auth
        .login(customer.username.as_str(), "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    auth.set_admin(customer.username.as_str(), true).await.unwrap();
    let user = auth
        .login(customer.username.as_str(), "integration-password")
        .await
        .unwrap();
    assert_eq!(user.id, customer.id);
    assert!(user.is_admin);
    assert_eq!(Identity::customer(user.id).user_id(), Some(customer.id));
}
