pub mod catalog_source;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use catalog_source::{load_configured_catalog, CatalogSourceError};
pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{CatalogSeed, SeedResult, VerificationResult};
pub use repositories::{
    load_snapshot, CatalogLoadError, CatalogProvider, InMemoryProductRepository,
    ProductRepository, RepositoryError, SqlProductRepository,
};
