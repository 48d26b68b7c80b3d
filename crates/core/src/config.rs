use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::domain::money::{CurrencyPolicy, Money};
use crate::filter::PriceBands;
use crate::session::DEFAULT_CITY;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub currency: CurrencyPolicy,
    pub weather: WeatherConfig,
    pub api: ApiConfig,
    pub cart: CartConfig,
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
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub page_size: usize,
    pub price_bands: PriceBands,
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub default_city: String,
    pub timeout_secs: u64,
}

/// Where clients find the storefront API.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CartConfig {
    pub mirror_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub api_base_url: Option<String>,
    pub weather_api_key: Option<String>,
    pub default_city: Option<String>,
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
                url: "sqlite://wardrobe.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            catalog: CatalogConfig {
                page_size: DEFAULT_PAGE_SIZE,
                price_bands: PriceBands::default(),
            },
            currency: CurrencyPolicy::default(),
            weather: WeatherConfig {
                base_url: "https://api.openweathermap.org/data/2.5".to_string(),
                api_key: None,
                default_city: DEFAULT_CITY.to_string(),
                timeout_secs: 10,
            },
            api: ApiConfig { base_url: "http://127.0.0.1:5000".to_string(), timeout_secs: 10 },
            cart: CartConfig { mirror_ttl_secs: 60 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("wardrobe.toml"));
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
        }

        if let Some(catalog) = patch.catalog {
            if let Some(page_size) = catalog.page_size {
                self.catalog.page_size = page_size;
            }
            if let Some(low) = catalog.price_band_low {
                self.catalog.price_bands.low = low;
            }
            if let Some(mid) = catalog.price_band_mid {
                self.catalog.price_bands.mid = mid;
            }
            if let Some(high) = catalog.price_band_high {
                self.catalog.price_bands.high = high;
            }
        }

        if let Some(currency) = patch.currency {
            if let Some(base) = currency.base {
                self.currency.base = base;
            }
            if let Some(display) = currency.display {
                self.currency.display = display;
            }
            if let Some(display_rate) = currency.display_rate {
                self.currency.display_rate = display_rate;
            }
        }

        if let Some(weather) = patch.weather {
            if let Some(base_url) = weather.base_url {
                self.weather.base_url = base_url;
            }
            if let Some(weather_api_key_value) = weather.api_key {
                self.weather.api_key = Some(secret_value(weather_api_key_value));
            }
            if let Some(default_city) = weather.default_city {
                self.weather.default_city = default_city;
            }
            if let Some(timeout_secs) = weather.timeout_secs {
                self.weather.timeout_secs = timeout_secs;
            }
        }

        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
        }

        if let Some(cart) = patch.cart {
            if let Some(mirror_ttl_secs) = cart.mirror_ttl_secs {
                self.cart.mirror_ttl_secs = mirror_ttl_secs;
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
        if let Some(value) = read_env("WARDROBE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("WARDROBE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("WARDROBE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("WARDROBE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("WARDROBE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("WARDROBE_SERVER_PORT") {
            self.server.port = parse_u16("WARDROBE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_CATALOG_PAGE_SIZE") {
            self.catalog.page_size = parse_usize("WARDROBE_CATALOG_PAGE_SIZE", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_CURRENCY_DISPLAY") {
            self.currency.display = value;
        }
        if let Some(value) = read_env("WARDROBE_CURRENCY_DISPLAY_RATE") {
            self.currency.display_rate = parse_decimal("WARDROBE_CURRENCY_DISPLAY_RATE", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_WEATHER_BASE_URL") {
            self.weather.base_url = value;
        }
        if let Some(value) = read_env("WARDROBE_WEATHER_API_KEY") {
            self.weather.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("WARDROBE_WEATHER_DEFAULT_CITY") {
            self.weather.default_city = value;
        }
        if let Some(value) = read_env("WARDROBE_WEATHER_TIMEOUT_SECS") {
            self.weather.timeout_secs = parse_u64("WARDROBE_WEATHER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("WARDROBE_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("WARDROBE_API_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WARDROBE_CART_MIRROR_TTL_SECS") {
            self.cart.mirror_ttl_secs = parse_u64("WARDROBE_CART_MIRROR_TTL_SECS", &value)?;
        }

        let log_level =
            read_env("WARDROBE_LOGGING_LEVEL").or_else(|| read_env("WARDROBE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WARDROBE_LOGGING_FORMAT").or_else(|| read_env("WARDROBE_LOG_FORMAT"));
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
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(api_base_url) = overrides.api_base_url {
            self.api.base_url = api_base_url;
        }
        if let Some(weather_api_key) = overrides.weather_api_key {
            self.weather.api_key = Some(secret_value(weather_api_key));
        }
        if let Some(default_city) = overrides.default_city {
            self.weather.default_city = default_city;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_currency(&self.currency)?;
        validate_weather(&self.weather)?;
        validate_api(&self.api)?;
        validate_cart(&self.cart)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("wardrobe.toml"), PathBuf::from("config/wardrobe.toml")]
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

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
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
    if catalog.page_size == 0 || catalog.page_size > 200 {
        return Err(ConfigError::Validation(
            "catalog.page_size must be in range 1..=200".to_string(),
        ));
    }

    let bands = &catalog.price_bands;
    if bands.low == Money::ZERO || bands.low >= bands.mid || bands.mid >= bands.high {
        return Err(ConfigError::Validation(
            "catalog price bands must satisfy 0 < price_band_low < price_band_mid < price_band_high"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_currency(currency: &CurrencyPolicy) -> Result<(), ConfigError> {
    if currency.base.trim().is_empty() || currency.display.trim().is_empty() {
        return Err(ConfigError::Validation(
            "currency.base and currency.display must not be empty".to_string(),
        ));
    }

    if currency.display_rate <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "currency.display_rate must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_weather(weather: &WeatherConfig) -> Result<(), ConfigError> {
    if !is_http_url(&weather.base_url) {
        return Err(ConfigError::Validation(
            "weather.base_url must start with http:// or https://".to_string(),
        ));
    }

    if weather.default_city.trim().is_empty() {
        return Err(ConfigError::Validation(
            "weather.default_city must not be empty".to_string(),
        ));
    }

    if let Some(api_key) = &weather.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "weather.api_key must not be blank when set".to_string(),
            ));
        }
    }

    if weather.timeout_secs == 0 || weather.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "weather.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    if !is_http_url(&api.base_url) {
        return Err(ConfigError::Validation(
            "api.base_url must start with http:// or https://".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_cart(cart: &CartConfig) -> Result<(), ConfigError> {
    if cart.mirror_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cart.mirror_ttl_secs must be greater than zero".to_string(),
        ));
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

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    currency: Option<CurrencyPatch>,
    weather: Option<WeatherPatch>,
    api: Option<ApiPatch>,
    cart: Option<CartPatch>,
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
}

/// Band boundaries are written in whole base-currency units, e.g. `20`.
#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    page_size: Option<usize>,
    price_band_low: Option<Money>,
    price_band_mid: Option<Money>,
    price_band_high: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrencyPatch {
    base: Option<String>,
    display: Option<String>,
    display_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    default_city: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CartPatch {
    mirror_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
