//! Integration test for additive schema evolution.
//!
//! Drops `shop.comment.user_id`, so it runs in its own test binary.
//!
//! Run with: cargo test -p litus-integration-tests --test schema_evolution -- --ignored

#![allow(clippy::unwrap_used)]

use litus_integration_tests::TestContext;
use litus_storefront::db::SchemaStore;

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_evolve_adds_missing_column_once() {
    let ctx = TestContext::new().await;
    let store = SchemaStore::new(&ctx.pool);
    assert!(store.verify().await.unwrap().is_empty());

    sqlx::query("ALTER TABLE shop.comment DROP COLUMN user_id")
        .execute(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(
        store.verify().await.unwrap(),
        vec!["shop.comment.user_id".to_owned()]
    );

    let report = store.evolve().await.unwrap();
    assert_eq!(report.migrations_applied, 0);
    assert_eq!(report.columns_added, vec!["shop.comment.user_id".to_owned()]);

    let report = store.evolve().await.unwrap();
    assert!(report.is_noop());
    assert!(store.verify().await.unwrap().is_empty());
}
