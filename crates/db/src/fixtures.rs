//! Built-in catalog fixture: loads the seed products into the `product`
//! table and checks that they are still there.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::info;
use unishop_core::catalog::seed_products;
use unishop_core::domain::product::Product;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

pub struct CatalogSeed;

impl CatalogSeed {
    /// Upserts every seed product in one transaction. Safe to rerun.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let products = seed_products();
        let mut tx = pool.begin().await?;

        for product in &products {
            sqlx::query(
                "INSERT INTO product (id, name, category, popularity, description)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     category = excluded.category,
                     popularity = excluded.popularity,
                     description = excluded.description,
                     updated_at = datetime('now')",
            )
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.popularity.to_string())
            .bind(&product.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let product_ids = products.iter().map(|product| product.id.0.clone()).collect::<Vec<_>>();
        info!(
            event_name = "db.catalog.seeded",
            products = product_ids.len(),
            "catalog seed loaded"
        );
        Ok(SeedResult { product_ids })
    }

    /// Seeds only when the table has no rows. Returns `None` when rows existed.
    pub async fn load_if_empty(pool: &DbPool) -> Result<Option<SeedResult>, RepositoryError> {
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(pool).await?;
        if existing > 0 {
            return Ok(None);
        }
        Self::load(pool).await.map(Some)
    }

    /// Checks each seed product is present with its seeded category and popularity.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in seed_products() {
            let present = Self::matches_stored(pool, &product).await?;
            checks.push((product.id.0, present));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    async fn matches_stored(pool: &DbPool, product: &Product) -> Result<bool, RepositoryError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT category, popularity FROM product WHERE id = ?",
        )
        .bind(product.id.as_str())
        .fetch_optional(pool)
        .await?;

        let Some((category, popularity)) = row else {
            return Ok(false);
        };
        let popularity = Decimal::from_str(popularity.trim())
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        Ok(category == product.category && popularity == product.popularity)
    }

    /// Removes seeded rows, leaving any other products untouched.
    pub async fn clean(pool: &DbPool) -> Result<u64, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut removed = 0;

        for product in seed_products() {
            removed += sqlx::query("DELETE FROM product WHERE id = ?")
                .bind(product.id.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub product_ids: Vec<String>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use unishop_core::catalog::seed_products;
    use unishop_core::domain::product::Product;

    use super::CatalogSeed;
    use crate::repositories::{ProductRepository, SqlProductRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = migrated_pool().await;

        let first = CatalogSeed::load(&pool).await.expect("load seed");
        let first_verification = CatalogSeed::verify(&pool).await.expect("verify seed");
        assert!(first_verification.all_present);
        assert_eq!(first.product_ids.len(), seed_products().len());

        let second = CatalogSeed::load(&pool).await.expect("reload seed");
        let second_verification = CatalogSeed::verify(&pool).await.expect("re-verify seed");
        assert!(second_verification.all_present);
        assert_eq!(second.product_ids, first.product_ids);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_flags_drifted_rows() {
        let pool = migrated_pool().await;
        CatalogSeed::load(&pool).await.expect("load seed");

        let first = seed_products().remove(0);
        let repo = SqlProductRepository::new(pool.clone());
        let drifted = Product { popularity: first.popularity + Decimal::ONE, ..first.clone() };
        repo.upsert(drifted).await.expect("drift row");

        let verification = CatalogSeed::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        let failed = verification
            .checks
            .iter()
            .filter(|(_, present)| !present)
            .map(|(id, _)| id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(failed, vec![first.id.as_str()]);
    }

    #[tokio::test]
    async fn load_if_empty_skips_populated_tables() {
        let pool = migrated_pool().await;

        assert!(CatalogSeed::load_if_empty(&pool).await.expect("seed").is_some());
        assert!(CatalogSeed::load_if_empty(&pool).await.expect("seed again").is_none());
    }

    #[tokio::test]
    async fn clean_removes_only_seeded_rows() {
        let pool = migrated_pool().await;
        CatalogSeed::load(&pool).await.expect("load seed");
        let repo = SqlProductRepository::new(pool.clone());
        repo.upsert(Product::new("custom-1", "Custom", "misc", Decimal::ONE))
            .await
            .expect("insert custom");

        let removed = CatalogSeed::clean(&pool).await.expect("clean");
        assert_eq!(removed, seed_products().len() as u64);
        assert_eq!(repo.count().await.expect("count"), 1);
    }
}
