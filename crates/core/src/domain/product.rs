use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::weather::WeatherCategory;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| DomainError::UnknownLabel { kind: "product id", value: value.to_string() })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fit {
    #[serde(rename = "Regular Fit")]
    Regular,
    #[serde(rename = "Slim Fit")]
    Slim,
    #[serde(rename = "Loose Fit")]
    Loose,
    #[serde(rename = "Oversized Fit")]
    Oversized,
}

impl Fit {
    pub const ALL: [Fit; 4] = [Fit::Regular, Fit::Slim, Fit::Loose, Fit::Oversized];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Regular => "Regular Fit",
            Self::Slim => "Slim Fit",
            Self::Loose => "Loose Fit",
            Self::Oversized => "Oversized Fit",
        }
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Fit {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let stem = normalized.strip_suffix(" fit").unwrap_or(&normalized);
        match stem {
            "regular" => Ok(Self::Regular),
            "slim" => Ok(Self::Slim),
            "loose" => Ok(Self::Loose),
            "oversized" => Ok(Self::Oversized),
            _ => Err(DomainError::UnknownLabel { kind: "fit", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Availability {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "in stock" => Ok(Self::InStock),
            "out of stock" => Ok(Self::OutOfStock),
            _ => Err(DomainError::UnknownLabel { kind: "availability", value: value.to_string() }),
        }
    }
}

/// One catalog item as shown to the shopper.
///
/// Products are built by the catalog generator and never mutated afterwards;
/// `weather` is never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub fit: Fit,
    pub color: String,
    pub price: Money,
    pub rating: Decimal,
    pub availability: Availability,
    pub size: Option<String>,
    pub fabric: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub image: String,
    pub weather: BTreeSet<WeatherCategory>,
}

impl Product {
    pub const DEFAULT_CATEGORY: &'static str = "T-Shirt";

    pub fn image_path(id: ProductId) -> String {
        format!("/res/tshirt/{id}.jpg")
    }

    pub fn suits(&self, category: WeatherCategory) -> bool {
        self.weather.contains(&category)
    }
}
