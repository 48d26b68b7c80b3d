use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use wardrobe_client::{ClientError, OpenWeatherProvider};
use wardrobe_core::config::{AppConfig, ConfigError, LoadOptions};
use wardrobe_db::{connect_with_config, migrations, DbPool};

use crate::api::{ApiState, SharedWeather};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub api: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("weather client setup failed: {0}")]
    WeatherClient(#[source] ClientError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let weather: SharedWeather = Arc::new(
        OpenWeatherProvider::from_config(&config.weather).map_err(BootstrapError::WeatherClient)?,
    );
    if config.weather.api_key.is_none() {
        info!(
            event_name = "system.bootstrap.weather_key_missing",
            correlation_id = "bootstrap",
            "no weather API key configured; city lookups will be unavailable"
        );
    }

    let api = ApiState::new(db_pool.clone(), &config, weather);
    Ok(Application { config, db_pool, api })
}

#[cfg(test)]
mod tests {
    use wardrobe_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(overrides("postgres://not-sqlite")).await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_connects_and_applies_storefront_schema() {
        let app = bootstrap(overrides("sqlite::memory:")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('app_user', 'product', 'cart_item', 'wishlist_item')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("storefront tables should exist after bootstrap");
        assert_eq!(table_count, 4);

        app.db_pool.close().await;
    }
}
