use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RELOAD_TOKEN_LEN: usize = 16;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub chatbot: ChatbotConfig,
    pub recommendations: RecommendationsConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub cors_allow_any_origin: bool,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    pub path: Option<PathBuf>,
    pub seed_on_empty: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ChatbotConfig {
    pub ruleset_path: Option<PathBuf>,
    pub fallback_response: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RecommendationsConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

#[derive(Clone, Debug, Default)]
pub struct AdminConfig {
    pub reload_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Where the catalog snapshot is loaded from at startup and on reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Database,
    File,
    Seed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub catalog_source: Option<CatalogSource>,
    pub catalog_path: Option<PathBuf>,
    pub ruleset_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://unishop.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                cors_allow_any_origin: false,
            },
            catalog: CatalogConfig {
                source: CatalogSource::Database,
                path: None,
                seed_on_empty: true,
            },
            chatbot: ChatbotConfig::default(),
            recommendations: RecommendationsConfig { default_limit: 5, max_limit: 100 },
            admin: AdminConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for CatalogSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "file" => Ok(Self::File),
            "seed" => Ok(Self::Seed),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog source `{other}` (expected database|file|seed)"
            ))),
        }
    }
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::File => "file",
            Self::Seed => "seed",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AdminConfig {
    /// Constant-time comparison against the configured reload token.
    pub fn reload_token_matches(&self, candidate: &str) -> bool {
        let Some(expected) = &self.reload_token else {
            return false;
        };
        let expected = expected.expose_secret().as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected.iter().zip(candidate).fold(0u8, |acc, (left, right)| acc | (left ^ right)) == 0
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("unishop.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(cors_allow_any_origin) = server.cors_allow_any_origin {
                self.server.cors_allow_any_origin = cors_allow_any_origin;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(source) = catalog.source {
                self.catalog.source = source;
            }
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(seed_on_empty) = catalog.seed_on_empty {
                self.catalog.seed_on_empty = seed_on_empty;
            }
        }

        if let Some(chatbot) = patch.chatbot {
            if let Some(ruleset_path) = chatbot.ruleset_path {
                self.chatbot.ruleset_path = Some(ruleset_path);
            }
            if let Some(fallback_response) = chatbot.fallback_response {
                self.chatbot.fallback_response = Some(fallback_response);
            }
        }

        if let Some(recommendations) = patch.recommendations {
            if let Some(default_limit) = recommendations.default_limit {
                self.recommendations.default_limit = default_limit;
            }
            if let Some(max_limit) = recommendations.max_limit {
                self.recommendations.max_limit = max_limit;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(reload_token_value) = admin.reload_token {
                self.admin.reload_token = Some(reload_token_value.into());
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("UNISHOP_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("UNISHOP_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("UNISHOP_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("UNISHOP_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("UNISHOP_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("UNISHOP_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("UNISHOP_SERVER_PORT") {
            self.server.port = parse_u16("UNISHOP_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("UNISHOP_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("UNISHOP_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("UNISHOP_SERVER_CORS_ALLOW_ANY_ORIGIN") {
            self.server.cors_allow_any_origin =
                parse_bool("UNISHOP_SERVER_CORS_ALLOW_ANY_ORIGIN", &value)?;
        }

        if let Some(value) = read_env("UNISHOP_CATALOG_SOURCE") {
            self.catalog.source = value.parse()?;
        }
        if let Some(value) = read_env("UNISHOP_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("UNISHOP_CATALOG_SEED_ON_EMPTY") {
            self.catalog.seed_on_empty = parse_bool("UNISHOP_CATALOG_SEED_ON_EMPTY", &value)?;
        }

        if let Some(value) = read_env("UNISHOP_CHATBOT_RULESET_PATH") {
            self.chatbot.ruleset_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("UNISHOP_CHATBOT_FALLBACK_RESPONSE") {
            self.chatbot.fallback_response = Some(value);
        }

        if let Some(value) = read_env("UNISHOP_RECOMMENDATIONS_DEFAULT_LIMIT") {
            self.recommendations.default_limit =
                parse_u32("UNISHOP_RECOMMENDATIONS_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("UNISHOP_RECOMMENDATIONS_MAX_LIMIT") {
            self.recommendations.max_limit =
                parse_u32("UNISHOP_RECOMMENDATIONS_MAX_LIMIT", &value)?;
        }

        if let Some(value) = read_env("UNISHOP_ADMIN_RELOAD_TOKEN") {
            self.admin.reload_token = Some(value.into());
        }

        let log_level =
            read_env("UNISHOP_LOGGING_LEVEL").or_else(|| read_env("UNISHOP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("UNISHOP_LOGGING_FORMAT").or_else(|| read_env("UNISHOP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(source) = overrides.catalog_source {
            self.catalog.source = source;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(ruleset_path) = overrides.ruleset_path {
            self.chatbot.ruleset_path = Some(ruleset_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_chatbot(&self.chatbot)?;
        validate_recommendations(&self.recommendations)?;
        validate_admin(&self.admin)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("unishop.toml"), PathBuf::from("config/unishop.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.source == CatalogSource::File {
        let missing =
            catalog.path.as_ref().map(|path| path.as_os_str().is_empty()).unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "catalog.path is required when catalog.source is `file`".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_chatbot(chatbot: &ChatbotConfig) -> Result<(), ConfigError> {
    if let Some(fallback) = &chatbot.fallback_response {
        if fallback.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chatbot.fallback_response must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_recommendations(recommendations: &RecommendationsConfig) -> Result<(), ConfigError> {
    if recommendations.default_limit == 0 {
        return Err(ConfigError::Validation(
            "recommendations.default_limit must be greater than zero".to_string(),
        ));
    }

    if recommendations.max_limit < recommendations.default_limit {
        return Err(ConfigError::Validation(
            "recommendations.max_limit must be at least recommendations.default_limit"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if let Some(token) = &admin.reload_token {
        if token.expose_secret().trim().len() < MIN_RELOAD_TOKEN_LEN {
            return Err(ConfigError::Validation(format!(
                "admin.reload_token must be at least {MIN_RELOAD_TOKEN_LEN} characters"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    chatbot: Option<ChatbotPatch>,
    recommendations: Option<RecommendationsPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    cors_allow_any_origin: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    source: Option<CatalogSource>,
    path: Option<PathBuf>,
    seed_on_empty: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatbotPatch {
    ruleset_path: Option<PathBuf>,
    fallback_response: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationsPatch {
    default_limit: Option<u32>,
    max_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    reload_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
