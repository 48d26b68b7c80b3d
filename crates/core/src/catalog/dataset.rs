//! Boundary between the persisted product dataset and typed records.
//!
//! The dataset is exchanged as rows keyed by human labels ("Product ID",
//! "Fit Type", ...). Rows are converted to [`ProductRecord`] exactly once,
//! where they enter the process; nothing past this module addresses product
//! fields by label.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::money::Money;
use crate::domain::product::{Availability, Fit, ProductId};
use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(rename = "Product ID", deserialize_with = "lenient_required")]
    pub product_id: String,
    #[serde(rename = "Product Name", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "Category", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "Color", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "Size", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "Fabric", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
    #[serde(rename = "Fit Type", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fit_type: Option<String>,
    #[serde(rename = "Price", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(rename = "Availability", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(rename = "User Ratings", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_ratings: Option<String>,
    #[serde(rename = "Product Description", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Keywords for Search", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// Accepts strings, numbers, or null; blank strings become `None`.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => non_blank(&text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient(deserializer)?.ok_or_else(|| serde::de::Error::custom("`Product ID` must not be blank"))
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A persisted product with typed fields. Fields that are missing or fail to
/// parse are `None`, leaving the generator to synthesize them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub fabric: Option<String>,
    pub fit: Option<Fit>,
    pub price: Option<Money>,
    pub availability: Option<Availability>,
    pub rating: Option<Decimal>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

impl ProductRecord {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            name: None,
            category: None,
            color: None,
            size: None,
            fabric: None,
            fit: None,
            price: None,
            availability: None,
            rating: None,
            description: None,
            keywords: None,
        }
    }

    pub fn from_row(row: DatasetRow) -> Result<Self, DomainError> {
        let product_id = row.product_id.parse::<ProductId>()?;
        Ok(Self {
            product_id,
            name: row.product_name.as_deref().and_then(non_blank),
            category: row.category.as_deref().and_then(non_blank),
            color: row.color.as_deref().and_then(non_blank),
            size: row.size.as_deref().and_then(non_blank),
            fabric: row.fabric.as_deref().and_then(non_blank),
            fit: row.fit_type.as_deref().and_then(|value| value.parse().ok()),
            price: row.price.as_deref().and_then(parse_price),
            availability: row.availability.as_deref().and_then(|value| value.parse().ok()),
            rating: row.user_ratings.as_deref().and_then(parse_rating),
            description: row.description.as_deref().and_then(non_blank),
            keywords: row.keywords.as_deref().and_then(non_blank),
        })
    }

    pub fn to_row(&self) -> DatasetRow {
        DatasetRow {
            product_id: self.product_id.to_string(),
            product_name: self.name.clone(),
            category: self.category.clone(),
            color: self.color.clone(),
            size: self.size.clone(),
            fabric: self.fabric.clone(),
            fit_type: self.fit.map(|fit| fit.label().to_string()),
            price: self.price.map(|price| price.to_string()),
            availability: self.availability.map(|availability| availability.label().to_string()),
            user_ratings: self.rating.map(|rating| rating.to_string()),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

fn parse_price(raw: &str) -> Option<Money> {
    let amount = raw.trim().parse::<Decimal>().ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }
    Money::from_decimal(amount).ok()
}

fn parse_rating(raw: &str) -> Option<Decimal> {
    let rating = raw.trim().parse::<Decimal>().ok()?;
    (Decimal::ZERO..=Decimal::from(5)).contains(&rating).then_some(rating)
}

/// Converts labelled rows to typed records, skipping rows whose id is not a
/// product id.
pub fn records_from_rows(rows: Vec<DatasetRow>) -> Vec<ProductRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let product_id = row.product_id.clone();
            match ProductRecord::from_row(row) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(
                        event_name = "catalog.dataset.row_skipped",
                        product_id = %product_id,
                        error = %error,
                        "skipping unreadable dataset row"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Persisted records indexed by product id.
#[derive(Clone, Debug, Default)]
pub struct PersistedDataset {
    records: HashMap<ProductId, ProductRecord>,
}

impl PersistedDataset {
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        Self { records: records.into_iter().map(|record| (record.product_id, record)).collect() }
    }

    pub fn get(&self, product_id: ProductId) -> Option<&ProductRecord> {
        self.records.get(&product_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{records_from_rows, DatasetRow, ProductRecord};
    use crate::domain::product::{Availability, Fit, ProductId};

    #[test]
    fn labelled_rows_convert_to_typed_records() {
        let row: DatasetRow = serde_json::from_value(json!({
            "Product ID": "917",
            "Product Name": "Breezy Linen Tee",
            "Color": "White",
            "Fit Type": "Loose Fit",
            "Price": 21.5,
            "Availability": "In Stock",
            "User Ratings": "4.6",
            "Fabric": "Linen",
        }))
        .expect("row should deserialize");

        let record = ProductRecord::from_row(row).expect("record");

        assert_eq!(record.product_id, ProductId(917));
        assert_eq!(record.name.as_deref(), Some("Breezy Linen Tee"));
        assert_eq!(record.fit, Some(Fit::Loose));
        assert_eq!(record.price.map(|price| price.minor_units()), Some(2150));
        assert_eq!(record.availability, Some(Availability::InStock));
        assert_eq!(record.rating, Some(Decimal::new(46, 1)));
    }

    #[test]
    fn oversized_price_is_left_for_synthesis() {
        let row: DatasetRow = serde_json::from_value(json!({
            "Product ID": "917",
            "Product Name": "Breezy Linen Tee",
            "Price": "70000000000000000000000000000",
        }))
        .expect("row should deserialize");

        let records = records_from_rows(vec![row]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Breezy Linen Tee"));
        assert_eq!(records[0].price, None);
    }

    #[test]
    fn unparseable_fields_are_left_for_synthesis() {
        let row: DatasetRow = serde_json::from_value(json!({
            "Product ID": 93,
            "Fit Type": "Baggy",
            "Price": "n/a",
            "User Ratings": "",
        }))
        .expect("row should deserialize");

        let record = ProductRecord::from_row(row).expect("record");

        assert_eq!(record.product_id, ProductId(93));
        assert_eq!(record.fit, None);
        assert_eq!(record.price, None);
        assert_eq!(record.rating, None);
    }

    #[test]
    fn ratings_outside_zero_to_five_are_rejected() {
        let row = DatasetRow {
            product_id: "101".to_string(),
            user_ratings: Some("7.5".to_string()),
            ..DatasetRow::default()
        };
        assert_eq!(ProductRecord::from_row(row).expect("record").rating, None);
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        let row = DatasetRow { product_id: "TS-1".to_string(), ..DatasetRow::default() };
        assert!(ProductRecord::from_row(row).is_err());
    }

    #[test]
    fn records_render_back_to_labelled_rows() {
        let mut record = ProductRecord::new(ProductId(120));
        record.fit = Some(Fit::Slim);
        record.availability = Some(Availability::OutOfStock);

        let value = serde_json::to_value(record.to_row()).expect("json");

        assert_eq!(value["Product ID"], "120");
        assert_eq!(value["Fit Type"], "Slim Fit");
        assert_eq!(value["Availability"], "Out of Stock");
        assert!(value.get("Price").is_none());
    }
}
