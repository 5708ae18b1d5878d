use unishop_core::catalog::CatalogSnapshot;
use unishop_core::config::{AppConfig, CatalogSource};
use unishop_core::errors::EngineError;
use unishop_core::recommendations::{RecommendationEngine, Recommendations};
use unishop_core::ProductId;
use unishop_db::{connect_with_config, load_configured_catalog, migrations};

use crate::commands::{load_config, runtime, CommandResult};

const COMMAND: &str = "recommend";

pub fn related(product_id: &str, limit: Option<i64>) -> CommandResult {
    let product_id = ProductId::new(product_id);
    with_engine(limit, |engine, limit| engine.recommend_by_category(&product_id, limit))
}

pub fn popular(limit: Option<i64>) -> CommandResult {
    with_engine(limit, |engine, limit| engine.recommend_popular(limit))
}

pub fn topic(query: &str, limit: Option<i64>) -> CommandResult {
    with_engine(limit, |engine, limit| engine.recommend_for_topic(query, limit))
}

fn with_engine(
    limit: Option<i64>,
    query: impl FnOnce(&RecommendationEngine, i64) -> Result<Recommendations, EngineError>,
) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let snapshot = match runtime.block_on(load_catalog(&config)) {
        Ok(snapshot) => snapshot,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure(COMMAND, error_class, message, exit_code);
        }
    };

    let engine = RecommendationEngine::with_catalog(snapshot);
    let limit = limit.unwrap_or(i64::from(config.recommendations.default_limit));
    match query(&engine, limit) {
        Ok(recommendations) => CommandResult::success_with_data(
            COMMAND,
            format!("{} products recommended", recommendations.len()),
            &recommendations,
        ),
        Err(error) => engine_failure(COMMAND, &error),
    }
}

async fn load_catalog(config: &AppConfig) -> Result<CatalogSnapshot, (&'static str, String, u8)> {
    let pool = match config.catalog.source {
        CatalogSource::Database => {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
            migrations::run_pending(&pool)
                .await
                .map_err(|error| ("migration", error.to_string(), 5u8))?;
            Some(pool)
        }
        CatalogSource::File | CatalogSource::Seed => None,
    };

    let snapshot = load_configured_catalog(&config.catalog, pool.as_ref())
        .await
        .map_err(|error| ("catalog_load", error.to_string(), 5u8));
    if let Some(pool) = pool {
        pool.close().await;
    }
    snapshot
}

/// Engine errors exit with 7 and carry the error kind as their class.
pub(crate) fn engine_failure(command: &str, error: &EngineError) -> CommandResult {
    CommandResult::failure(command, error.kind(), error.to_string(), 7)
}
