//! Weather classification and the weather-to-product index.
//!
//! Precipitation and wind are checked before temperature: they decide
//! whether a shopper needs waterproof or wind-resistant garments regardless
//! of how warm it is.

pub mod index;

use crate::domain::weather::{WeatherCategory, WeatherObservation};

pub use index::WeatherIndex;

pub const WINDY_THRESHOLD_MS: f64 = 8.0;
pub const HOT_THRESHOLD_C: f64 = 25.0;
pub const COLD_THRESHOLD_C: f64 = 10.0;

const RAIN_MARKERS: [&str; 3] = ["rain", "drizzle", "thunderstorm"];

/// Maps an observation to exactly one category. First match wins.
pub fn classify(observation: &WeatherObservation) -> WeatherCategory {
    let condition = observation.condition.to_lowercase();

    if RAIN_MARKERS.iter().any(|marker| condition.contains(marker)) {
        WeatherCategory::Rain
    } else if condition.contains("snow") {
        WeatherCategory::Snow
    } else if observation.wind_speed_ms > WINDY_THRESHOLD_MS {
        WeatherCategory::Windy
    } else if observation.temperature_c >= HOT_THRESHOLD_C {
        WeatherCategory::Hot
    } else if observation.temperature_c <= COLD_THRESHOLD_C {
        WeatherCategory::Cold
    } else {
        WeatherCategory::Moderate
    }
}
