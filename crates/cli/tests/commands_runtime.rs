use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use unishop_cli::commands::{chat, migrate, recommend, seed};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("UNISHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("UNISHOP_DATABASE_URL", "postgres://localhost/unishop")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_every_builtin_product() {
    with_env(&[("UNISHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or_default();
        let expected_count = unishop_core::seed_products().len();
        let expected_prefix = format!("built-in catalog loaded: {expected_count} products");
        assert!(message.starts_with(&expected_prefix));
        assert!(message.contains("book-clean-code"));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("seed.db").display());

    with_env(&[("UNISHOP_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        let second = seed::run();

        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        assert_eq!(parse_payload(&first.output), parse_payload(&second.output));
    });
}

#[test]
fn recommend_popular_reads_the_seed_catalog() {
    with_env(&[("UNISHOP_CATALOG_SOURCE", "seed")], || {
        let result = recommend::popular(Some(2));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["source"]["kind"], "popular");
        assert_eq!(payload["data"]["products"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn recommend_related_uses_database_catalog_seeded_on_empty() {
    with_env(&[("UNISHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = recommend::related("book-clean-code", None);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["source"]["product_id"], "book-clean-code");
        let ids = payload["data"]["products"]
            .as_array()
            .expect("products")
            .iter()
            .filter_map(|product| product["id"].as_str())
            .collect::<Vec<_>>();
        assert!(!ids.contains(&"book-clean-code"));
    });
}

#[test]
fn recommend_reports_engine_errors_with_their_kind() {
    with_env(&[("UNISHOP_CATALOG_SOURCE", "seed")], || {
        let missing = recommend::related("no-such-product", Some(3));
        assert_eq!(missing.exit_code, 7);
        assert_eq!(parse_payload(&missing.output)["error_class"], "not_found");

        let bad_limit = recommend::popular(Some(0));
        assert_eq!(bad_limit.exit_code, 7);
        assert_eq!(parse_payload(&bad_limit.output)["error_class"], "invalid_argument");
    });
}

#[test]
fn recommend_reports_unreadable_catalog_files() {
    with_env(
        &[
            ("UNISHOP_CATALOG_SOURCE", "file"),
            ("UNISHOP_CATALOG_PATH", "/nonexistent/unishop-catalog.toml"),
        ],
        || {
            let result = recommend::popular(None);
            assert_eq!(result.exit_code, 5);
            assert_eq!(parse_payload(&result.output)["error_class"], "catalog_load");
        },
    );
}

#[test]
fn chat_uses_builtin_ruleset_and_configured_fallback() {
    with_env(&[("UNISHOP_CHATBOT_FALLBACK_RESPONSE", "Try asking about shipping.")], || {
        let matched = parse_payload(&chat::run("What are your hours?").output);
        assert_eq!(matched["data"]["matched_rule"], "hours");

        let fallback = parse_payload(&chat::run("zzz qqq").output);
        assert_eq!(fallback["data"]["outcome"], "fallback");
        assert_eq!(fallback["data"]["response"], "Try asking about shipping.");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "UNISHOP_DATABASE_URL",
        "UNISHOP_DATABASE_MAX_CONNECTIONS",
        "UNISHOP_DATABASE_TIMEOUT_SECS",
        "UNISHOP_SERVER_BIND_ADDRESS",
        "UNISHOP_SERVER_PORT",
        "UNISHOP_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "UNISHOP_SERVER_CORS_ALLOW_ANY_ORIGIN",
        "UNISHOP_CATALOG_SOURCE",
        "UNISHOP_CATALOG_PATH",
        "UNISHOP_CATALOG_SEED_ON_EMPTY",
        "UNISHOP_CHATBOT_RULESET_PATH",
        "UNISHOP_CHATBOT_FALLBACK_RESPONSE",
        "UNISHOP_RECOMMENDATIONS_DEFAULT_LIMIT",
        "UNISHOP_RECOMMENDATIONS_MAX_LIMIT",
        "UNISHOP_ADMIN_RELOAD_TOKEN",
        "UNISHOP_LOGGING_LEVEL",
        "UNISHOP_LOGGING_FORMAT",
        "UNISHOP_LOG_LEVEL",
        "UNISHOP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
