//! Seed the demo catalog.
//!
//! Inserts five categories and twelve products keyed by slug. Rows that
//! already exist are left untouched, so the command is safe to re-run.

use litus_core::{Price, Slug};

use super::{CommandError, connect};

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
}

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    /// Price in kuruş.
    price_minor: i64,
    description: &'static str,
    stock: i32,
    category: &'static str,
    likes: i32,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory { name: "Kadın", slug: "kadin" },
    SeedCategory { name: "Erkek", slug: "erkek" },
    SeedCategory { name: "Çocuk", slug: "cocuk" },
    SeedCategory { name: "Home & Aksesuar", slug: "home-aksesuar" },
    SeedCategory { name: "Koleksiyonlar", slug: "koleksiyonlar" },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Litus Premium Deniz Mavisi Elbise",
        slug: "litus-premium-deniz-mavisi-elbise",
        price_minor: 129_900,
        description: "Denizin derin mavisi tonlarında, premium kumaştan üretilmiş şık elbise. Sahil temalı zarif tasarım.",
        stock: 15,
        category: "kadin",
        likes: 42,
    },
    SeedProduct {
        name: "Litus Klasik Erkek Gömlek",
        slug: "litus-klasik-erkek-gomlek",
        price_minor: 59_900,
        description: "Klasik kesim, yumuşak pamuklu kumaş. Günlük kullanım için ideal, şık ve rahat.",
        stock: 25,
        category: "erkek",
        likes: 38,
    },
    SeedProduct {
        name: "Litus Çocuk Deniz Kıyısı Tişört",
        slug: "litus-cocuk-deniz-kiyisi-tisort",
        price_minor: 29_900,
        description: "Çocuklar için eğlenceli deniz temalı tişört. Yumuşak ve nefes alabilir kumaş.",
        stock: 30,
        category: "cocuk",
        likes: 25,
    },
    SeedProduct {
        name: "Litus Premium Altın Aksesuar Seti",
        slug: "litus-premium-altin-aksesuar-seti",
        price_minor: 89_900,
        description: "Altın tonlarında zarif aksesuar seti. Sahil temalı özel tasarım.",
        stock: 12,
        category: "home-aksesuar",
        likes: 35,
    },
    SeedProduct {
        name: "Litus Özel Koleksiyon Ceket",
        slug: "litus-ozel-koleksiyon-ceket",
        price_minor: 189_900,
        description: "Özel koleksiyon parçası. Premium malzeme, özenli işçilik. Sınırlı sayıda.",
        stock: 8,
        category: "koleksiyonlar",
        likes: 55,
    },
    SeedProduct {
        name: "Litus Kadın Sahil Şortu",
        slug: "litus-kadin-sahil-sortu",
        price_minor: 44_900,
        description: "Rahat ve şık sahil şortu. Yüksek kalite kumaş, modern kesim.",
        stock: 20,
        category: "kadin",
        likes: 28,
    },
    SeedProduct {
        name: "Litus Erkek Denizci Pantolon",
        slug: "litus-erkek-denizci-pantolon",
        price_minor: 79_900,
        description: "Klasik denizci tarzı pantolon. Dayanıklı ve şık.",
        stock: 18,
        category: "erkek",
        likes: 32,
    },
    SeedProduct {
        name: "Litus Çocuk Deniz Yıldızı Şapka",
        slug: "litus-cocuk-deniz-yildizi-sapka",
        price_minor: 19_900,
        description: "Eğlenceli deniz yıldızı desenli şapka. UV korumalı.",
        stock: 35,
        category: "cocuk",
        likes: 20,
    },
    SeedProduct {
        name: "Litus Premium Ev Tekstili Seti",
        slug: "litus-premium-ev-tekstili-seti",
        price_minor: 129_900,
        description: "Ev dekorasyonu için premium tekstil seti. Sahil temalı zarif desenler.",
        stock: 10,
        category: "home-aksesuar",
        likes: 40,
    },
    SeedProduct {
        name: "Litus Limited Edition Çanta",
        slug: "litus-limited-edition-canta",
        price_minor: 159_900,
        description: "Sınırlı sayıda üretilmiş özel tasarım çanta. Premium deri ve altın detaylar.",
        stock: 5,
        category: "koleksiyonlar",
        likes: 48,
    },
    SeedProduct {
        name: "Litus Kadın Özel Tasarım Etek",
        slug: "litus-kadin-ozel-tasarim-etek",
        price_minor: 69_900,
        description: "Özel tasarım, sahil temalı zarif etek. Yüksek kalite kumaş.",
        stock: 15,
        category: "kadin",
        likes: 30,
    },
    SeedProduct {
        name: "Litus Erkek Premium Polo",
        slug: "litus-erkek-premium-polo",
        price_minor: 54_900,
        description: "Premium polo yaka tişört. Klasik ve şık tasarım.",
        stock: 22,
        category: "erkek",
        likes: 27,
    },
];

/// Check every slug and price before touching the database.
fn validate() -> Result<(), CommandError> {
    for category in CATEGORIES {
        Slug::parse(category.slug)
            .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", category.slug)))?;
    }
    for product in PRODUCTS {
        Slug::parse(product.slug)
            .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", product.slug)))?;
        Price::from_minor_units(product.price_minor)
            .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", product.slug)))?;
        if !CATEGORIES.iter().any(|c| c.slug == product.category) {
            return Err(CommandError::InvalidSeed(format!(
                "{}: unknown category {}",
                product.slug, product.category
            )));
        }
    }
    Ok(())
}

/// Seed categories and products in one transaction.
pub async fn run() -> Result<(), CommandError> {
    validate()?;
    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut categories_inserted = 0;
    for category in CATEGORIES {
        let result = sqlx::query(
            "INSERT INTO shop.category (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(category.name)
        .bind(category.slug)
        .execute(&mut *tx)
        .await?;
        categories_inserted += result.rows_affected();
    }

    let mut products_inserted = 0;
    for product in PRODUCTS {
        let price = Price::from_minor_units(product.price_minor)
            .map_err(|e| CommandError::InvalidSeed(e.to_string()))?;
        let result = sqlx::query(
            r"
            INSERT INTO shop.product (name, slug, price, description, stock, category_id, likes)
            SELECT $1, $2, $3, $4, $5, c.id, $7
            FROM shop.category c
            WHERE c.slug = $6
            ON CONFLICT (slug) DO NOTHING
            ",
        )
        .bind(product.name)
        .bind(product.slug)
        .bind(price)
        .bind(product.description)
        .bind(product.stock)
        .bind(product.category)
        .bind(product.likes)
        .execute(&mut *tx)
        .await?;
        products_inserted += result.rows_affected();
    }

    tx.commit().await?;

    tracing::info!(
        categories_inserted,
        categories_total = CATEGORIES.len(),
        products_inserted,
        products_total = PRODUCTS.len(),
        "Seed complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data_is_valid() {
        assert!(validate().is_ok());
        assert_eq!(CATEGORIES.len(), 5);
        assert_eq!(PRODUCTS.len(), 12);
    }

    #[test]
    fn test_seed_slugs_unique() {
        let mut slugs: Vec<_> = PRODUCTS.iter().map(|p| p.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), PRODUCTS.len());
    }
}
