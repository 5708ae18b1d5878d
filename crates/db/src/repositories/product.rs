use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use unishop_core::domain::product::{Product, ProductId};

use super::{CatalogProvider, ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let popularity_text: String =
        row.try_get("popularity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let popularity = Decimal::from_str(popularity_text.trim()).map_err(|e| {
        RepositoryError::Decode(format!("product `{id}` has popularity `{popularity_text}`: {e}"))
    })?;

    Ok(Product { id: ProductId(id), name, category, popularity, description })
}

#[async_trait::async_trait]
impl CatalogProvider for SqlProductRepository {
    async fn fetch_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, category, popularity, description
             FROM product
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, category, popularity, description
             FROM product
             WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn upsert(&self, product: Product) -> Result<(), RepositoryError> {
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
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|e| RepositoryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use unishop_core::domain::product::{Product, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::{load_snapshot, CatalogProvider, ProductRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn upsert_and_find_round_trip_exact_popularity() {
        let repo = SqlProductRepository::new(setup().await);
        let popularity = Decimal::new(30_25, 2);
        repo.upsert(
            Product::new("B", "Road Shoe", "shoes", popularity).with_description("lightweight"),
        )
        .await
        .expect("upsert");

        let product =
            repo.find_product(&ProductId::from("B")).await.expect("find").expect("present");
        assert_eq!(product.popularity, popularity);
        assert_eq!(product.description.as_deref(), Some("lightweight"));
        assert!(repo.find_product(&ProductId::from("missing")).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let repo = SqlProductRepository::new(setup().await);
        repo.upsert(Product::new("A", "Trail", "shoes", Decimal::from(10))).await.expect("insert");
        repo.upsert(Product::new("A", "Trail", "shoes", Decimal::from(11))).await.expect("update");

        assert_eq!(repo.count().await.expect("count"), 1);
        let product = repo.find_product(&ProductId::from("A")).await.expect("find");
        assert_eq!(product.map(|p| p.popularity), Some(Decimal::from(11)));
    }

    #[tokio::test]
    async fn snapshot_from_database_follows_canonical_order() {
        let repo = SqlProductRepository::new(setup().await);
        for product in [
            Product::new("A", "A", "shoes", Decimal::from(10)),
            Product::new("B", "B", "shoes", Decimal::from(30)),
            Product::new("C", "C", "bags", Decimal::from(20)),
        ] {
            repo.upsert(product).await.expect("upsert");
        }

        let snapshot = load_snapshot(&repo).await.expect("snapshot");
        let ids = snapshot.ranked().iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn undecodable_popularity_is_a_decode_error() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO product (id, name, category, popularity)
             VALUES ('x', 'X', 'misc', 'lots')",
        )
        .execute(&pool)
        .await
        .expect("raw insert");

        let repo = SqlProductRepository::new(pool);
        assert!(matches!(repo.fetch_products().await, Err(RepositoryError::Decode(_))));
    }
}
