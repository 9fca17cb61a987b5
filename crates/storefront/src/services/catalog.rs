//! Catalog accessor: category and product reads, likes, and admin changes.
//!
//! Categories change rarely and appear on every page, so the list is cached
//! in-process and invalidated whenever an admin adds or removes one.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use litus_core::{CategoryId, ProductId, Slug};

use super::{MediaStore, ShopError};
use crate::db::catalog::ProductRecord;
use crate::db::{CatalogRepository, Replay, StoragePolicy};
use crate::models::{Category, NewCategory, Product, ProductFilter, ProductInput};

/// Products per home page section.
pub const HOME_SECTION_LIMIT: i64 = 6;

const CATEGORIES_KEY: &str = "categories";

/// In-process category list cache (10 minute TTL).
#[derive(Clone)]
pub struct CategoryCache {
    cache: Cache<&'static str, Arc<Vec<Category>>>,
}

impl CategoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(600))
            .build();
        Self { cache }
    }

    async fn get(&self) -> Option<Arc<Vec<Category>>> {
        self.cache.get(CATEGORIES_KEY).await
    }

    async fn insert(&self, categories: Arc<Vec<Category>>) {
        self.cache.insert(CATEGORIES_KEY, categories).await;
    }

    async fn invalidate(&self) {
        self.cache.invalidate(CATEGORIES_KEY).await;
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Home page sections.
#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    /// Most-liked products.
    pub featured: Vec<Product>,
    /// Most recently added products.
    pub newest: Vec<Product>,
    /// All categories.
    pub categories: Arc<Vec<Category>>,
}

/// Catalog operations.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    policy: StoragePolicy,
    categories: &'a CategoryCache,
}

impl<'a> CatalogService<'a> {
    /// Create a catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: StoragePolicy, categories: &'a CategoryCache) -> Self {
        Self {
            pool,
            policy,
            categories,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All categories, served from cache when warm.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, ShopError> {
        if let Some(categories) = self.categories.get().await {
            return Ok(categories);
        }
        let pool = self.pool;
        let categories = Arc::new(
            self.policy
                .run("catalog.list_categories", Replay::Idempotent, move || async move {
                    CatalogRepository::new(pool).list_categories().await
                })
                .await?,
        );
        self.categories.insert(Arc::clone(&categories)).await;
        Ok(categories)
    }

    /// Products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ShopError> {
        let pool = self.pool;
        let category = filter.category;
        let search = filter.search_term();
        Ok(self
            .policy
            .run("catalog.list_products", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool)
                    .list_products(category, search)
                    .await
            })
            .await?)
    }

    /// Featured and newest products plus categories.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if storage does not respond.
    pub async fn home(&self, limit: i64) -> Result<HomePage, ShopError> {
        let pool = self.pool;
        let featured = self
            .policy
            .run("catalog.featured", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).featured(limit).await
            })
            .await?;
        let newest = self
            .policy
            .run("catalog.newest", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).newest(limit).await
            })
            .await?;
        Ok(HomePage {
            featured,
            newest,
            categories: self.list_categories().await?,
        })
    }

    /// A product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if no product has that slug.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ShopError> {
        let pool = self.pool;
        self.policy
            .run("catalog.product_by_slug", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).product_by_slug(slug).await
            })
            .await?
            .ok_or(ShopError::NotFound("product"))
    }

    /// A product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, ShopError> {
        let pool = self.pool;
        self.policy
            .run("catalog.product", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).product_by_id(id).await
            })
            .await?
            .ok_or(ShopError::NotFound("product"))
    }

    /// Increment a product's like counter; returns the new count.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn like(&self, id: ProductId) -> Result<i32, ShopError> {
        let pool = self.pool;
        self.policy
            .run("catalog.like", Replay::AtMostOnce, move || async move {
                CatalogRepository::new(pool).increment_likes(id).await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product"))
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a category. The slug is derived from the name when omitted.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for a blank name or malformed slug, or
    /// `ShopError::Conflict` if the slug is taken.
    #[instrument(skip(self))]
    pub async fn create_category(&self, input: &NewCategory) -> Result<Category, ShopError> {
        let name = required_name(&input.name, "category")?;
        let slug = slug_or_derived(input.slug.as_deref(), name)?;
        let pool = self.pool;
        let slug = &slug;

        let category = self
            .policy
            .run("catalog.create_category", Replay::AtMostOnce, move || async move {
                CatalogRepository::new(pool).create_category(name, slug).await
            })
            .await?;

        self.categories.invalidate().await;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Delete a category no product references.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ReferentialConflict` if products reference it, or
    /// `ShopError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ShopError> {
        let pool = self.pool;
        let products = self
            .policy
            .run("catalog.count_products", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool)
                    .count_products_in_category(id)
                    .await
            })
            .await?;
        if products > 0 {
            return Err(referenced(products));
        }

        self.policy
            .run("catalog.delete_category", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).delete_category(id).await
            })
            .await
            .map_err(|e| match e {
                // A product was added between the count and the delete
                crate::db::RepositoryError::Conflict(_) => referenced(1),
                other => ShopError::from_repository(other, "category"),
            })?;

        self.categories.invalidate().await;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for invalid input, `ShopError::NotFound`
    /// if the category does not exist, or `ShopError::Conflict` if the slug is
    /// taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ShopError> {
        let record = product_record(input)?;
        let pool = self.pool;
        let record_ref = &record;
        let id = self
            .policy
            .run("catalog.create_product", Replay::AtMostOnce, move || async move {
                CatalogRepository::new(pool).create_product(record_ref).await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "category"))?;

        tracing::info!(product_id = %id, slug = %record.slug, "Product created");
        self.product(id).await
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for invalid input, `ShopError::NotFound`
    /// if the product or category does not exist, or `ShopError::Conflict` if
    /// the slug is taken.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> Result<Product, ShopError> {
        let record = product_record(input)?;
        let pool = self.pool;
        let record = &record;
        self.policy
            .run("catalog.update_product", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).update_product(id, record).await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product or category"))?;

        tracing::info!(product_id = %id, "Product updated");
        self.product(id).await
    }

    /// Delete a product and its image. Cart lines, favorites, and comments go
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` if the product does not exist.
    #[instrument(skip(self, media))]
    pub async fn delete_product(&self, id: ProductId, media: &MediaStore) -> Result<(), ShopError> {
        let pool = self.pool;
        let image = self
            .policy
            .run("catalog.delete_product", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).delete_product(id).await
            })
            .await
            .map_err(|e| ShopError::from_repository(e, "product"))?;

        if let Some(image) = image {
            media.delete_image(&image).await;
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Store a new product image and drop the previous one.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for a rejected upload,
    /// `ShopError::NotFound` if the product does not exist, or
    /// `ShopError::Media` if the file cannot be written.
    #[instrument(skip(self, media, bytes), fields(bytes = bytes.len()))]
    pub async fn set_product_image(
        &self,
        id: ProductId,
        file_name: &str,
        bytes: &[u8],
        media: &MediaStore,
    ) -> Result<Product, ShopError> {
        // Check first so a missing product doesn't leave an orphan file
        self.product(id).await?;

        let stored = media.save_image(file_name, bytes).await?;
        let pool = self.pool;
        let stored_ref = stored.as_str();
        let previous = self
            .policy
            .run("catalog.set_image", Replay::Idempotent, move || async move {
                CatalogRepository::new(pool).set_image_path(id, stored_ref).await
            })
            .await;

        match previous {
            Ok(Some(previous)) if previous != stored => media.delete_image(&previous).await,
            Ok(_) => {}
            Err(e) => {
                media.delete_image(&stored).await;
                return Err(ShopError::from_repository(e, "product"));
            }
        }
        self.product(id).await
    }
}

fn referenced(products: i64) -> ShopError {
    ShopError::ReferentialConflict(format!(
        "category still has {products} product(s); move or delete them first"
    ))
}

fn required_name<'s>(name: &'s str, what: &str) -> Result<&'s str, ShopError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ShopError::Validation(format!("{what} name is required")));
    }
    Ok(name)
}

fn slug_or_derived(slug: Option<&str>, name: &str) -> Result<Slug, ShopError> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Slug::parse(slug).map_err(|e| ShopError::Validation(e.to_string())),
        None => Ok(Slug::from_name(name)),
    }
}

fn product_record(input: &ProductInput) -> Result<ProductRecord, ShopError> {
    let name = required_name(&input.name, "product")?;
    if name.chars().count() > 200 {
        return Err(ShopError::Validation(
            "product name must be at most 200 characters".to_owned(),
        ));
    }
    if input.stock < 0 {
        return Err(ShopError::Validation("stock cannot be negative".to_owned()));
    }
    Ok(ProductRecord {
        name: name.to_owned(),
        slug: slug_or_derived(input.slug.as_deref(), name)?,
        price: input.price,
        description: input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned),
        stock: input.stock,
        category_id: input.category_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use litus_core::Price;

    use super::*;

    fn input(name: &str, slug: Option<&str>, stock: i32) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            slug: slug.map(str::to_owned),
            price: Price::from_minor_units(129_900).unwrap(),
            description: Some("  ".to_owned()),
            stock,
            category_id: CategoryId::new(1),
        }
    }

    #[test]
    fn test_product_record_derives_slug() {
        let record = product_record(&input(" Litus Klasik Erkek Gömlek ", None, 3)).unwrap();
        assert_eq!(record.name, "Litus Klasik Erkek Gömlek");
        assert_eq!(record.slug.as_str(), "litus-klasik-erkek-gomlek");
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_product_record_rejects_invalid() {
        assert!(matches!(
            product_record(&input("  ", None, 0)),
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            product_record(&input("Elbise", None, -1)),
            Err(ShopError::Validation(_))
        ));
        assert!(matches!(
            product_record(&input("Elbise", Some("Bad Slug"), 0)),
            Err(ShopError::Validation(_))
        ));
    }

    #[test]
    fn test_explicit_slug_wins() {
        let record = product_record(&input("Elbise", Some("yaz-elbise"), 0)).unwrap();
        assert_eq!(record.slug.as_str(), "yaz-elbise");
    }

    #[test]
    fn test_referenced_message() {
        assert!(matches!(referenced(2), ShopError::ReferentialConflict(msg) if msg.contains('2')));
    }

    #[tokio::test]
    async fn test_category_cache_invalidate() {
        let cache = CategoryCache::new();
        assert!(cache.get().await.is_none());

        let categories = Arc::new(vec![Category {
            id: CategoryId::new(1),
            name: "Kadın".to_owned(),
            slug: Slug::parse("kadin").unwrap(),
        }]);
        cache.insert(Arc::clone(&categories)).await;
        assert_eq!(cache.get().await.unwrap().len(), 1);

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }
}
