//! Filtering and sorting of a product list.
//!
//! Every non-empty criterion must match (logical AND). A product lacking the
//! field a criterion looks at does not match it. Sorting runs after
//! filtering and is stable, so ties and the unsorted case keep input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::money::{CurrencyPolicy, Money};
use crate::domain::product::{Availability, Product};
use crate::errors::DomainError;

/// Price buckets over the base-currency price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceBucket {
    #[serde(rename = "under20")]
    Under,
    #[serde(rename = "20to30")]
    LowToMid,
    #[serde(rename = "30to40")]
    MidToHigh,
    #[serde(rename = "over40")]
    Over,
}

impl PriceBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under => "under20",
            Self::LowToMid => "20to30",
            Self::MidToHigh => "30to40",
            Self::Over => "over40",
        }
    }
}

impl FromStr for PriceBucket {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "under20" => Ok(Self::Under),
            "20to30" => Ok(Self::LowToMid),
            "30to40" => Ok(Self::MidToHigh),
            "over40" => Ok(Self::Over),
            other => Err(DomainError::UnknownLabel { kind: "price range", value: other.to_string() }),
        }
    }
}

/// Boundaries of the four price buckets, in base-currency minor units:
/// `< low`, `[low, mid]`, `(mid, high]`, `> high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBands {
    pub low: Money,
    pub mid: Money,
    pub high: Money,
}

impl Default for PriceBands {
    fn default() -> Self {
        Self {
            low: Money::from_minor_units(2_000),
            mid: Money::from_minor_units(3_000),
            high: Money::from_minor_units(4_000),
        }
    }
}

impl PriceBands {
    pub fn bucket_of(&self, price: Money) -> PriceBucket {
        if price < self.low {
            PriceBucket::Under
        } else if price <= self.mid {
            PriceBucket::LowToMid
        } else if price <= self.high {
            PriceBucket::MidToHigh
        } else {
            PriceBucket::Over
        }
    }

    pub fn label(&self, bucket: PriceBucket, currency: &CurrencyPolicy) -> String {
        let show = |amount: Money| format!("{} {}", currency.display, currency.to_display(amount));
        match bucket {
            PriceBucket::Under => format!("Under {}", show(self.low)),
            PriceBucket::LowToMid => format!("{} - {}", show(self.low), show(self.mid)),
            PriceBucket::MidToHigh => format!("{} - {}", show(self.mid), show(self.high)),
            PriceBucket::Over => format!("Over {}", show(self.high)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "priceLow")]
    PriceAsc,
    #[serde(rename = "priceHigh")]
    PriceDesc,
    #[serde(rename = "rating")]
    RatingDesc,
    #[serde(rename = "name")]
    Name,
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "priceLow" => Ok(Self::PriceAsc),
            "priceHigh" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::RatingDesc),
            "name" => Ok(Self::Name),
            other => Err(DomainError::UnknownLabel { kind: "sort key", value: other.to_string() }),
        }
    }
}

impl SortKey {
    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::RatingDesc => b.rating.cmp(&a.rating),
            Self::Name => a.name.cmp(&b.name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facet {
    Color,
    Size,
    Fabric,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "Color",
            Self::Size => "Size",
            Self::Fabric => "Fabric",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub query: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub fabric: Option<String>,
    pub price_range: Option<PriceBucket>,
    pub availability: Option<Availability>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedFilter {
    pub name: &'static str,
    pub label: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        active(&self.query).is_none()
            && active(&self.color).is_none()
            && active(&self.size).is_none()
            && active(&self.fabric).is_none()
            && self.price_range.is_none()
            && self.availability.is_none()
    }

    pub fn matches(&self, product: &Product, bands: &PriceBands) -> bool {
        if let Some(query) = active(&self.query) {
            let query = query.to_lowercase();
            let hit = std::iter::once(Some(product.name.as_str()))
                .chain([product.description.as_deref(), product.keywords.as_deref()])
                .flatten()
                .any(|field| field.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }
        if let Some(color) = active(&self.color) {
            if product.color != color {
                return false;
            }
        }
        if let Some(size) = active(&self.size) {
            if product.size.as_deref() != Some(size) {
                return false;
            }
        }
        if let Some(fabric) = active(&self.fabric) {
            if product.fabric.as_deref() != Some(fabric) {
                return false;
            }
        }
        if let Some(availability) = self.availability {
            if product.availability != availability {
                return false;
            }
        }
        if let Some(bucket) = self.price_range {
            if bands.bucket_of(product.price) != bucket {
                return false;
            }
        }
        true
    }

    /// Display tags for the active criteria, in form order. The text query
    /// is shown by the search box and is not listed.
    pub fn applied(&self, bands: &PriceBands, currency: &CurrencyPolicy) -> Vec<AppliedFilter> {
        let mut applied = Vec::new();
        if let Some(color) = active(&self.color) {
            applied.push(AppliedFilter { name: "color", label: format!("Color: {color}") });
        }
        if let Some(size) = active(&self.size) {
            applied.push(AppliedFilter { name: "size", label: format!("Size: {size}") });
        }
        if let Some(fabric) = active(&self.fabric) {
            applied.push(AppliedFilter { name: "fabric", label: format!("Fabric: {fabric}") });
        }
        if let Some(availability) = self.availability {
            applied.push(AppliedFilter {
                name: "availability",
                label: format!("Availability: {availability}"),
            });
        }
        if let Some(bucket) = self.price_range {
            applied.push(AppliedFilter {
                name: "priceRange",
                label: format!("Price: {}", bands.label(bucket, currency)),
            });
        }
        applied
    }

    /// Clears one criterion by its applied-filter name.
    pub fn remove(&mut self, name: &str) {
        match name {
            "query" => self.query = None,
            "color" => self.color = None,
            "size" => self.size = None,
            "fabric" => self.fabric = None,
            "availability" => self.availability = None,
            "priceRange" => self.price_range = None,
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        *self = Self { query: self.query.take(), ..Self::default() };
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Filters then sorts. Without a sort key the filtered products keep their
/// input order.
pub fn apply(
    products: &[Product],
    criteria: &FilterCriteria,
    sort: Option<SortKey>,
    bands: &PriceBands,
) -> Vec<Product> {
    let mut filtered: Vec<Product> =
        products.iter().filter(|product| criteria.matches(product, bands)).cloned().collect();

    if let Some(key) = sort {
        filtered.sort_by(|a, b| key.compare(a, b));
    }

    filtered
}

/// Distinct non-empty values of `facet`, in first-seen order.
pub fn filter_options(products: &[Product], facet: Facet) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for product in products {
        let value = match facet {
            Facet::Color => Some(product.color.as_str()),
            Facet::Size => product.size.as_deref(),
            Facet::Fabric => product.fabric.as_deref(),
        };
        if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
            if !options.iter().any(|existing| existing == value) {
                options.push(value.to_string());
            }
        }
    }
    options
}
