use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Join key between weather observations and garments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCategory {
    Hot,
    Moderate,
    Cold,
    Rain,
    Snow,
    Windy,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 6] = [
        WeatherCategory::Hot,
        WeatherCategory::Moderate,
        WeatherCategory::Cold,
        WeatherCategory::Rain,
        WeatherCategory::Snow,
        WeatherCategory::Windy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Moderate => "moderate",
            Self::Cold => "cold",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Windy => "windy",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Hot => "Hot Weather",
            Self::Moderate => "Moderate Weather",
            Self::Cold => "Cold Weather",
            Self::Rain => "Rainy Weather",
            Self::Snow => "Snowy Weather",
            Self::Windy => "Windy Weather",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCategory {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "moderate" => Ok(Self::Moderate),
            "cold" => Ok(Self::Cold),
            "rain" => Ok(Self::Rain),
            "snow" => Ok(Self::Snow),
            "windy" => Ok(Self::Windy),
            _ => Err(DomainError::UnknownLabel {
                kind: "weather category",
                value: value.to_string(),
            }),
        }
    }
}

/// Current conditions for a city. Temperatures are Celsius, wind is m/s.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub condition: String,
    pub wind_speed_ms: f64,
}

impl WeatherObservation {
    pub fn new(temperature_c: f64, condition: impl AsRef<str>, wind_speed_ms: f64) -> Self {
        Self {
            temperature_c,
            condition: condition.as_ref().trim().to_lowercase(),
            wind_speed_ms,
        }
    }
}
