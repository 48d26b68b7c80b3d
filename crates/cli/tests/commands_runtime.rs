use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use wardrobe_cli::commands::browse::BrowseArgs;
use wardrobe_cli::commands::{browse, classify, migrate, seed};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("WARDROBE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_bad_port() {
    with_env(&[("WARDROBE_SERVER_PORT", "not-a-port")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_loaded_rows() {
    with_env(&[("WARDROBE_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["user_id"], "demo-user");
        assert_eq!(payload["data"]["dataset_rows"], 21);
    });
}

#[test]
fn seed_is_idempotent_against_one_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&dir);

    with_env(&[("WARDROBE_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "first seed: {}", first.output);
        let second = seed::run();
        assert_eq!(second.exit_code, 0, "second seed: {}", second.output);

        let first = parse_payload(&first.output);
        let second = parse_payload(&second.output);
        assert_eq!(first["data"]["dataset_rows"], second["data"]["dataset_rows"]);
        assert_eq!(second["data"]["placeholder_rows"], 0, "id-only rows are inserted once");
    });
}

#[test]
fn browse_filters_a_seeded_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = file_url(&dir);

    with_env(&[("WARDROBE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let args = BrowseArgs {
            count: Some(30),
            color: Some("Black".to_string()),
            sort: Some("priceLow".to_string()),
            ..BrowseArgs::default()
        };
        let result = browse::run(&args);
        assert_eq!(result.exit_code, 0, "browse: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["generated"], 30);
        assert_eq!(payload["data"]["applied_filters"][0], "Color: Black");
        let products = payload["data"]["products"].as_array().expect("products");
        assert!(products.iter().all(|product| product["color"] == "Black"));
    });
}

#[test]
fn browse_rejects_unknown_labels_before_touching_the_database() {
    with_env(&[("WARDROBE_DATABASE_URL", "sqlite::memory:")], || {
        let args = BrowseArgs { sort: Some("cheapest".to_string()), ..BrowseArgs::default() };
        let result = browse::run(&args);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_filter");
    });
}

#[test]
fn classify_covers_rain_hot_and_cold() {
    let rain = parse_payload(&classify::run(20.0, "Light Rain", 2.0).output);
    assert_eq!(rain["data"]["category"], "rain");
    assert_eq!(rain["message"], "Rainy Weather");

    let hot = parse_payload(&classify::run(30.0, "clear", 3.0).output);
    assert_eq!(hot["data"]["category"], "hot");

    let cold = parse_payload(&classify::run(-4.0, "clear", 1.0).output);
    assert_eq!(cold["data"]["category"], "cold");
}

#[test]
fn classify_requires_a_condition() {
    let result = classify::run(18.0, "   ", 0.0);
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "invalid_observation");
}

fn file_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("wardrobe.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "WARDROBE_DATABASE_URL",
        "WARDROBE_DATABASE_MAX_CONNECTIONS",
        "WARDROBE_DATABASE_TIMEOUT_SECS",
        "WARDROBE_SERVER_BIND_ADDRESS",
        "WARDROBE_SERVER_PORT",
        "WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "WARDROBE_CATALOG_PAGE_SIZE",
        "WARDROBE_CURRENCY_DISPLAY",
        "WARDROBE_CURRENCY_DISPLAY_RATE",
        "WARDROBE_WEATHER_API_KEY",
        "WARDROBE_API_BASE_URL",
        "WARDROBE_LOGGING_LEVEL",
        "WARDROBE_LOGGING_FORMAT",
        "WARDROBE_LOG_LEVEL",
        "WARDROBE_LOG_FORMAT",
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
