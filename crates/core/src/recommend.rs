//! Weather-driven recommendations for the logged-in shopper's city.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogGenerator, ProductSource};
use crate::domain::product::Product;
use crate::domain::weather::{WeatherCategory, WeatherObservation};
use crate::session::SessionContext;
use crate::weather::classify;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 6;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("city `{0}` was not recognised by the weather provider")]
    UnknownCity(String),
    #[error("weather provider unavailable: {0}")]
    Unavailable(String),
    #[error("weather provider returned malformed data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherObservation, WeatherError>;
}

#[async_trait]
impl<T> WeatherProvider for Arc<T>
where
    T: WeatherProvider + ?Sized,
{
    async fn current(&self, city: &str) -> Result<WeatherObservation, WeatherError> {
        (**self).current(city).await
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendations {
    pub city: String,
    pub observation: WeatherObservation,
    pub category: WeatherCategory,
    pub title: String,
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    LoginRequired,
    WeatherUnavailable { city: String, message: String },
    Ready(Recommendations),
}

pub fn weather_unavailable_message(city: &str) -> String {
    format!("Could not fetch weather for {city}. Please try another city.")
}

pub struct RecommendationService<W, S> {
    weather: W,
    catalog: Arc<CatalogGenerator<S>>,
    session: Arc<SessionContext>,
}

impl<W, S> RecommendationService<W, S>
where
    W: WeatherProvider,
    S: ProductSource,
{
    pub fn new(weather: W, catalog: Arc<CatalogGenerator<S>>, session: Arc<SessionContext>) -> Self {
        Self { weather, catalog, session }
    }

    /// Recommendations for the session's city, or the default city when the
    /// shopper has not set one.
    pub async fn for_session(&self, limit: usize) -> RecommendationOutcome {
        if !self.session.is_logged_in() {
            return RecommendationOutcome::LoginRequired;
        }
        let city = self.session.city();

        match self.for_city(&city, limit).await {
            Ok(ready) => RecommendationOutcome::Ready(ready),
            Err(error) => {
                warn!(
                    event_name = "recommend.weather.failed",
                    city = %city,
                    error = %error,
                    "weather lookup failed"
                );
                RecommendationOutcome::WeatherUnavailable {
                    message: weather_unavailable_message(&city),
                    city,
                }
            }
        }
    }

    /// Recommendations for an explicit city, with no session involved.
    pub async fn for_city(&self, city: &str, limit: usize) -> Result<Recommendations, WeatherError> {
        let observation = self.weather.current(city).await?;
        Ok(self.for_observation(city.to_string(), observation, limit).await)
    }

    /// Skips the provider; used when the caller already has an observation.
    pub async fn for_observation(
        &self,
        city: String,
        observation: WeatherObservation,
        limit: usize,
    ) -> Recommendations {
        let category = classify(&observation);
        let products = self.catalog.generate_for_category(category, limit).await;
        info!(
            event_name = "recommend.ready",
            city = %city,
            category = category.as_str(),
            product_count = products.len(),
            "recommendations assembled"
        );
        Recommendations { city, title: category.title().to_string(), observation, category, products }
    }
}
