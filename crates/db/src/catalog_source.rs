//! Resolves the configured catalog source into a snapshot.

use thiserror::Error;
use tracing::info;
use unishop_core::catalog::{seed_products, CatalogError, CatalogSnapshot};
use unishop_core::config::{CatalogConfig, CatalogSource};

use crate::connection::DbPool;
use crate::fixtures::CatalogSeed;
use crate::repositories::{load_snapshot, CatalogLoadError, RepositoryError};
use crate::SqlProductRepository;

#[derive(Debug, Error)]
pub enum CatalogSourceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Database(#[from] CatalogLoadError),
    #[error("seeding the empty catalog failed: {0}")]
    Seed(#[from] RepositoryError),
    #[error("catalog source `{kind}` is missing its {missing}")]
    Misconfigured { kind: &'static str, missing: &'static str },
}

/// Builds a snapshot from the source named in `config`. The database source
/// needs `pool` and seeds an empty table first when `seed_on_empty` is set.
pub async fn load_configured_catalog(
    config: &CatalogConfig,
    pool: Option<&DbPool>,
) -> Result<CatalogSnapshot, CatalogSourceError> {
    match config.source {
        CatalogSource::Seed => Ok(CatalogSnapshot::new(seed_products())?),
        CatalogSource::File => {
            let path = config.path.as_deref().ok_or(CatalogSourceError::Misconfigured {
                kind: "file",
                missing: "catalog.path",
            })?;
            Ok(CatalogSnapshot::load_file(path)?)
        }
        CatalogSource::Database => {
            let pool = pool.ok_or(CatalogSourceError::Misconfigured {
                kind: "database",
                missing: "connection pool",
            })?;
            if config.seed_on_empty {
                if let Some(seeded) = CatalogSeed::load_if_empty(pool).await? {
                    info!(
                        event_name = "db.catalog.seeded_on_empty",
                        products = seeded.product_ids.len(),
                        "empty product table seeded with the built-in catalog"
                    );
                }
            }
            let repository = SqlProductRepository::new(pool.clone());
            Ok(load_snapshot(&repository).await?)
        }
    }
}
