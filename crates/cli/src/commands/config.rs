use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use wardrobe_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, Some(env_key), config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let weather_api_key = match &config.weather.api_key {
        Some(key) => redact_key(key.expose_secret()),
        None => "<unset>".to_string(),
    };

    let entries: Vec<(&str, String, &str)> = vec![
        ("database.url", config.database.url.clone(), "WARDROBE_DATABASE_URL"),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            "WARDROBE_DATABASE_MAX_CONNECTIONS",
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "WARDROBE_DATABASE_TIMEOUT_SECS",
        ),
        ("server.bind_address", config.server.bind_address.clone(), "WARDROBE_SERVER_BIND_ADDRESS"),
        ("server.port", config.server.port.to_string(), "WARDROBE_SERVER_PORT"),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        ("catalog.page_size", config.catalog.page_size.to_string(), "WARDROBE_CATALOG_PAGE_SIZE"),
        ("currency.display", config.currency.display.clone(), "WARDROBE_CURRENCY_DISPLAY"),
        (
            "currency.display_rate",
            config.currency.display_rate.to_string(),
            "WARDROBE_CURRENCY_DISPLAY_RATE",
        ),
        ("weather.base_url", config.weather.base_url.clone(), "WARDROBE_WEATHER_BASE_URL"),
        ("weather.api_key", weather_api_key, "WARDROBE_WEATHER_API_KEY"),
        ("weather.default_city", config.weather.default_city.clone(), "WARDROBE_WEATHER_DEFAULT_CITY"),
        ("api.base_url", config.api.base_url.clone(), "WARDROBE_API_BASE_URL"),
        ("api.timeout_secs", config.api.timeout_secs.to_string(), "WARDROBE_API_TIMEOUT_SECS"),
        (
            "cart.mirror_ttl_secs",
            config.cart.mirror_ttl_secs.to_string(),
            "WARDROBE_CART_MIRROR_TTL_SECS",
        ),
        ("logging.level", config.logging.level.clone(), "WARDROBE_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "WARDROBE_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        entries
            .into_iter()
            .map(|(key, value, env_key)| render_line(key, &value, source(key, env_key))),
    );
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("wardrobe.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/wardrobe.toml");
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
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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

/// Keeps the first four characters so operators can tell keys apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
