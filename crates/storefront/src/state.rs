//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::StoragePolicy;
use crate::services::{
    AuthService, CartLedger, CatalogService, CategoryCache, CommentLog, FavoritesSet,
    IdentityResolver, MediaStore,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    categories: CategoryCache,
    media: MediaStore,
    resolver: IdentityResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let media = MediaStore::new(config.upload_dir.clone());
        let resolver = IdentityResolver::new(config.allow_guests);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                categories: CategoryCache::default(),
                media,
                resolver,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Storage timeout and retry policy.
    #[must_use]
    pub fn policy(&self) -> StoragePolicy {
        self.inner.config.storage
    }

    /// Product image store.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Request identity resolver.
    #[must_use]
    pub fn resolver(&self) -> &IdentityResolver {
        &self.inner.resolver
    }

    // =========================================================================
    // Service constructors
    // =========================================================================

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.pool(), self.policy(), &self.inner.categories)
    }

    #[must_use]
    pub fn cart(&self) -> CartLedger<'_> {
        CartLedger::new(self.pool(), self.policy())
    }

    #[must_use]
    pub fn favorites(&self) -> FavoritesSet<'_> {
        FavoritesSet::new(self.pool(), self.policy())
    }

    #[must_use]
    pub fn comments(&self) -> CommentLog<'_> {
        CommentLog::new(self.pool(), self.policy())
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.pool(), self.policy())
    }
}
