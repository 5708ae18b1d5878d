use std::collections::HashMap;

use tokio::sync::RwLock;

use unishop_core::domain::product::{Product, ProductId};

use super::{CatalogProvider, ProductRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products =
            products.into_iter().map(|product| (product.id.0.clone(), product)).collect();
        Self { products: RwLock::new(products) }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for InMemoryProductRepository {
    async fn fetch_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut all = products.values().cloned().collect::<Vec<_>>();
        all.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(all)
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn upsert(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.products.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use unishop_core::domain::product::{Product, ProductId};

    use crate::repositories::{
        load_snapshot, CatalogLoadError, CatalogProvider, InMemoryProductRepository,
        ProductRepository,
    };

    #[tokio::test]
    async fn upsert_replaces_existing_product() {
        let repo = InMemoryProductRepository::default();
        repo.upsert(Product::new("p1", "Pen", "office", Decimal::from(3)))
            .await
            .expect("insert");
        repo.upsert(Product::new("p1", "Pen v2", "office", Decimal::from(4)))
            .await
            .expect("update");

        let product =
            repo.find_product(&ProductId::from("p1")).await.expect("find").expect("present");
        assert_eq!(product.name, "Pen v2");
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn snapshot_is_ranked_from_provider_rows() {
        let repo = InMemoryProductRepository::with_products([
            Product::new("a", "A", "shoes", Decimal::from(10)),
            Product::new("b", "B", "shoes", Decimal::from(30)),
            Product::new("c", "C", "bags", Decimal::from(20)),
        ]);

        let snapshot = load_snapshot(&repo).await.expect("snapshot");
        let ids = snapshot.ranked().iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn invalid_rows_surface_as_catalog_errors() {
        let repo = InMemoryProductRepository::with_products([Product::new(
            "a",
            "A",
            "shoes",
            Decimal::from(-1),
        )]);

        assert!(matches!(load_snapshot(&repo).await, Err(CatalogLoadError::Catalog(_))));
    }
}
