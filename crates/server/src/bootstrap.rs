use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use unishop_core::catalog::CatalogSnapshot;
use unishop_core::chatbot::{ChatbotEngine, Ruleset, RulesetError};
use unishop_core::config::{AppConfig, CatalogConfig, CatalogSource, ChatbotConfig, ConfigError};
use unishop_core::recommendations::RecommendationEngine;
use unishop_db::{
    connect_with_config, load_configured_catalog, migrations, CatalogSourceError, DbPool,
};

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: Option<DbPool>,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Catalog(#[from] CatalogSourceError),
    #[error(transparent)]
    Ruleset(#[from] RulesetError),
}

/// Where catalog and ruleset snapshots come from, at startup and on reload.
#[derive(Clone, Debug)]
pub struct SnapshotSources {
    catalog: CatalogConfig,
    chatbot: ChatbotConfig,
    db_pool: Option<DbPool>,
}

impl SnapshotSources {
    pub fn new(catalog: CatalogConfig, chatbot: ChatbotConfig, db_pool: Option<DbPool>) -> Self {
        Self { catalog, chatbot, db_pool }
    }

    pub async fn load_catalog(&self) -> Result<CatalogSnapshot, SourceError> {
        Ok(load_configured_catalog(&self.catalog, self.db_pool.as_ref()).await?)
    }

    pub fn load_ruleset(&self) -> Result<Ruleset, SourceError> {
        Ok(Ruleset::from_config(&self.chatbot)?)
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        catalog_source = config.catalog.source.as_str(),
        "starting application bootstrap"
    );

    let db_pool = match config.catalog.source {
        CatalogSource::Database => {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.database_ready",
                correlation_id = "bootstrap",
                "database connected and migrations applied"
            );
            Some(pool)
        }
        CatalogSource::File | CatalogSource::Seed => None,
    };

    let sources =
        SnapshotSources::new(config.catalog.clone(), config.chatbot.clone(), db_pool.clone());

    let recommendations = RecommendationEngine::default();
    match sources.load_catalog().await {
        Ok(snapshot) => {
            info!(
                event_name = "system.bootstrap.catalog_loaded",
                correlation_id = "bootstrap",
                products = snapshot.len(),
                "catalog snapshot loaded"
            );
            recommendations.replace_catalog(snapshot);
        }
        Err(error) => warn!(
            event_name = "system.bootstrap.catalog_unavailable",
            correlation_id = "bootstrap",
            error = %error,
            "catalog failed to load; recommendations stay unavailable until reload"
        ),
    }

    let chatbot = ChatbotEngine::default();
    match sources.load_ruleset() {
        Ok(ruleset) => {
            info!(
                event_name = "system.bootstrap.ruleset_loaded",
                correlation_id = "bootstrap",
                rules = ruleset.len(),
                "chatbot ruleset loaded"
            );
            chatbot.replace_ruleset(ruleset);
        }
        Err(error) => warn!(
            event_name = "system.bootstrap.ruleset_unavailable",
            correlation_id = "bootstrap",
            error = %error,
            "ruleset failed to load; chat stays unavailable until reload"
        ),
    }

    let state = AppState::new(
        recommendations,
        chatbot,
        Arc::new(sources),
        config.recommendations.clone(),
        config.admin.clone(),
    );

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use unishop_core::catalog::seed_products;
    use unishop_core::config::{AppConfig, CatalogSource, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn options(source: CatalogSource) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                catalog_source: Some(source),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn seed_source_boots_both_engines() {
        let app = bootstrap(options(CatalogSource::Seed)).await.expect("bootstrap");

        assert!(app.db_pool.is_none());
        assert!(app.state.recommendations.is_ready());
        assert!(app.state.chatbot.is_ready());
    }

    #[tokio::test]
    async fn database_source_seeds_an_empty_table() {
        let app = bootstrap(options(CatalogSource::Database)).await.expect("bootstrap");

        let pool = app.db_pool.as_ref().expect("database pool");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(pool)
            .await
            .expect("count");
        assert_eq!(count as usize, seed_products().len());

        let popular = app.state.recommendations.recommend_popular(3).expect("popular");
        assert_eq!(popular.len(), 3);
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_catalog_file_leaves_recommendations_unloaded() {
        let mut options = options(CatalogSource::File);
        options.overrides.catalog_path = Some(PathBuf::from("/nonexistent/unishop-catalog.toml"));

        let app = bootstrap(options).await.expect("bootstrap still succeeds");

        assert!(!app.state.recommendations.is_ready());
        assert!(app.state.chatbot.is_ready());
    }

    #[tokio::test]
    async fn invalid_ruleset_leaves_chat_unloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.toml");
        fs::write(
            &path,
            r#"
[[rules]]
id = "bad"
response = "x"
pattern = { kind = "regex", expression = "(" }
"#,
        )
        .expect("write ruleset");

        let mut options = options(CatalogSource::Seed);
        options.overrides.ruleset_path = Some(path);
        let app = bootstrap(options).await.expect("bootstrap still succeeds");

        assert!(app.state.recommendations.is_ready());
        assert!(!app.state.chatbot.is_ready());
    }

    #[tokio::test]
    async fn configuration_errors_abort_startup() {
        let mut options = options(CatalogSource::Seed);
        options.overrides.database_url = Some("postgres://localhost/unishop".to_string());

        let error = bootstrap(options).await.err().expect("invalid database url");
        assert!(error.to_string().contains("database.url"));
    }
}
