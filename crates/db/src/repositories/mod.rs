use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use unishop_core::catalog::{CatalogError, CatalogSnapshot};
use unishop_core::domain::product::{Product, ProductId};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read-only source of product records for the recommendation engine.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Write side used by seeding and operator tooling.
#[async_trait]
pub trait ProductRepository: CatalogProvider {
    async fn upsert(&self, product: Product) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("catalog rows are inconsistent: {0}")]
    Catalog(#[from] CatalogError),
}

/// Fetches every product and builds a validated snapshot from them.
pub async fn load_snapshot(
    provider: &dyn CatalogProvider,
) -> Result<CatalogSnapshot, CatalogLoadError> {
    let products = provider.fetch_products().await?;
    let snapshot = CatalogSnapshot::new(products)?;
    debug!(event_name = "db.catalog.snapshot_built", products = snapshot.len(), "catalog loaded");
    Ok(snapshot)
}
