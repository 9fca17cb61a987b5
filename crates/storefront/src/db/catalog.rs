//! Catalog repository: categories and products.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use litus_core::{CategoryId, Price, ProductId, Slug};

use super::{RepositoryError, classify_write_error};
use crate::models::{Category, Product};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.slug, p.price, p.description, p.stock, p.image_path,
    p.category_id, c.name AS category_name, p.likes, p.created_at
";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category slug in database: {e}"))
        })?;
        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    price: Price,
    description: Option<String>,
    stock: i32,
    image_path: Option<String>,
    category_id: i32,
    category_name: String,
    likes: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product slug in database: {e}"))
        })?;
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug,
            price: row.price,
            description: row.description,
            stock: row.stock,
            image_path: row.image_path,
            category_id: CategoryId::new(row.category_id),
            category_name: row.category_name,
            likes: row.likes,
            created_at: row.created_at,
        })
    }
}

/// Validated column values for a product insert or update.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    /// Display name (non-empty).
    pub name: String,
    /// URL slug.
    pub slug: Slug,
    /// Unit price.
    pub price: Price,
    /// Optional description.
    pub description: Option<String>,
    /// Units in stock (non-negative).
    pub stock: i32,
    /// Owning category.
    pub category_id: CategoryId,
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Category::try_from).collect()
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO shop.category (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "category slug already exists"))?;
        Category::try_from(row)
    }

    /// Number of products referencing a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products_in_category(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE category_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Conflict` if products still reference it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict("category has products".to_owned());
                }
                RepositoryError::Database(e)
            })?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products, newest first, optionally filtered by category and a
    /// case-insensitive name substring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        category: Option<CategoryId>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            WHERE ($1::INT4 IS NULL OR p.category_id = $1)
              AND ($2::TEXT IS NULL OR p.name ILIKE $2 ESCAPE '\')
            ORDER BY p.created_at DESC, p.id DESC
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .bind(pattern)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Most-liked products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            ORDER BY p.likes DESC, p.id
            LIMIT $1
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Most recently created products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            WHERE p.slug = $1
            "
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            WHERE p.id = $1
            "
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Atomically increment a product's like counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn increment_likes(&self, id: ProductId) -> Result<i32, RepositoryError> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE shop.product SET likes = likes + 1 WHERE id = $1 RETURNING likes",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists, or
    /// `RepositoryError::NotFound` if the category does not exist.
    pub async fn create_product(
        &self,
        record: &ProductRecord,
    ) -> Result<ProductId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product (name, slug, price, description, stock, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(record.price)
        .bind(record.description.as_deref())
        .bind(record.stock)
        .bind(record.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "product slug already exists"))?;
        Ok(ProductId::new(id))
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or category does not
    /// exist, or `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_product(
        &self,
        id: ProductId,
        record: &ProductRecord,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET name = $2, slug = $3, price = $4, description = $5, stock = $6, category_id = $7
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(record.price)
        .bind(record.description.as_deref())
        .bind(record.stock)
        .bind(record.category_id)
        .execute(self.pool)
        .await
        .map_err(|e| classify_write_error(e, "product slug already exists"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Point a product at a new image, returning the previous image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_image_path(
        &self,
        id: ProductId,
        image_path: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r"
            UPDATE shop.product p
            SET image_path = $2
            FROM (SELECT id, image_path FROM shop.product WHERE id = $1 FOR UPDATE) old
            WHERE p.id = old.id
            RETURNING old.image_path
            ",
        )
        .bind(id)
        .bind(image_path)
        .fetch_optional(self.pool)
        .await?;
        previous.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, returning its image path. Cart lines, favorites, and
    /// comments referencing it are removed by `ON DELETE CASCADE`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<Option<String>, RepositoryError> {
        let deleted: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM shop.product WHERE id = $1 RETURNING image_path")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        deleted.ok_or(RepositoryError::NotFound)
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("elbise"), "elbise");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
