use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use unishop_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in effective_fields(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

type Field = (&'static str, String, &'static [&'static str]);

fn field(key_path: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    (key_path, value, env_keys)
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let optional_path = |path: Option<&Path>| {
        path.map(|path| path.display().to_string()).unwrap_or_else(|| "<unset>".to_string())
    };

    vec![
        field("database.url", config.database.url.clone(), &["UNISHOP_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["UNISHOP_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["UNISHOP_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["UNISHOP_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["UNISHOP_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["UNISHOP_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "server.cors_allow_any_origin",
            config.server.cors_allow_any_origin.to_string(),
            &["UNISHOP_SERVER_CORS_ALLOW_ANY_ORIGIN"],
        ),
        field(
            "catalog.source",
            config.catalog.source.as_str().to_string(),
            &["UNISHOP_CATALOG_SOURCE"],
        ),
        field(
            "catalog.path",
            optional_path(config.catalog.path.as_deref()),
            &["UNISHOP_CATALOG_PATH"],
        ),
        field(
            "catalog.seed_on_empty",
            config.catalog.seed_on_empty.to_string(),
            &["UNISHOP_CATALOG_SEED_ON_EMPTY"],
        ),
        field(
            "chatbot.ruleset_path",
            optional_path(config.chatbot.ruleset_path.as_deref()),
            &["UNISHOP_CHATBOT_RULESET_PATH"],
        ),
        field(
            "chatbot.fallback_response",
            config.chatbot.fallback_response.clone().unwrap_or_else(|| "<builtin>".to_string()),
            &["UNISHOP_CHATBOT_FALLBACK_RESPONSE"],
        ),
        field(
            "recommendations.default_limit",
            config.recommendations.default_limit.to_string(),
            &["UNISHOP_RECOMMENDATIONS_DEFAULT_LIMIT"],
        ),
        field(
            "recommendations.max_limit",
            config.recommendations.max_limit.to_string(),
            &["UNISHOP_RECOMMENDATIONS_MAX_LIMIT"],
        ),
        field(
            "admin.reload_token",
            redact_secret(config.admin.reload_token.as_ref().map(|token| token.expose_secret())),
            &["UNISHOP_ADMIN_RELOAD_TOKEN"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["UNISHOP_LOGGING_LEVEL", "UNISHOP_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["UNISHOP_LOGGING_FORMAT", "UNISHOP_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("unishop.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/unishop.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&str>) -> String {
    match secret.map(str::trim) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
