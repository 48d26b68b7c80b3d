//! Current-conditions lookup against an OpenWeatherMap-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use wardrobe_core::config::WeatherConfig;
use wardrobe_core::domain::weather::WeatherObservation;
use wardrobe_core::recommend::{WeatherError, WeatherProvider};

use crate::ClientError;

#[derive(Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OpenWeatherProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, api_key })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.api_key.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainReadings,
    #[serde(default)]
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

impl CurrentWeather {
    fn into_observation(self) -> Result<WeatherObservation, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .and_then(|condition| {
                condition
                    .description
                    .filter(|text| !text.trim().is_empty())
                    .or(condition.main)
            })
            .ok_or_else(|| WeatherError::Malformed("response has no weather condition".to_string()))?;
        let wind = self.wind.map(|wind| wind.speed).unwrap_or(0.0);
        Ok(WeatherObservation::new(self.main.temp, condition, wind))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<WeatherObservation, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::UnknownCity(String::new()));
        }
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| WeatherError::Unavailable("weather API key is not configured".to_string()))?;

        let response = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", city), ("units", "metric"), ("appid", api_key.expose_secret())])
            .send()
            .await
            .map_err(|error| WeatherError::Unavailable(error.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(WeatherError::UnknownCity(city.to_string())),
            status => {
                return Err(WeatherError::Unavailable(format!("provider answered {status}")));
            }
        }

        let body = response
            .json::<CurrentWeather>()
            .await
            .map_err(|error| WeatherError::Malformed(error.to_string()))?;
        let observation = body.into_observation()?;
        debug!(
            event_name = "weather.observation.fetched",
            city = %city,
            temperature_c = observation.temperature_c,
            condition = %observation.condition,
            wind_speed_ms = observation.wind_speed_ms,
            "current weather fetched"
        );
        Ok(observation)
    }
}
