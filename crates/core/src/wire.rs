//! JSON bodies exchanged with the storefront API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::DatasetRow;
use crate::checkout::{OrderLine, OrderSummary};
use crate::domain::cart::{CartLine, UserId, WishlistLine};
use crate::domain::product::ProductId;

pub const PRODUCT_DETAILS_MISSING: &str = "Product details not found";

/// Body of `POST|PUT|DELETE /api/cart` and `POST|DELETE /api/wishlist`.
///
/// Ids are optional so the handler can answer a missing id with its own
/// message instead of a generic decode failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_product_id", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "lenient_quantity", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl LineRequest {
    pub fn new(user_id: &UserId, product_id: ProductId) -> Self {
        Self { user_id: Some(user_id.clone()), product_id: Some(product_id), quantity: None }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCartRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityUpdate {
    pub city: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub message: String,
    pub cart_item: CartLine,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemResponse {
    pub message: String,
    pub wishlist_item: WishlistLine,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCartResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductDetails {
    Found(DatasetRow),
    Missing { message: String },
}

impl ProductDetails {
    pub fn from_row(row: Option<DatasetRow>) -> Self {
        row.map(Self::Found)
            .unwrap_or_else(|| Self::Missing { message: PRODUCT_DETAILS_MISSING.to_string() })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDetails {
    #[serde(flatten)]
    pub line: CartLine,
    pub product_details: ProductDetails,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistLineDetails {
    #[serde(flatten)]
    pub line: WishlistLine,
    pub product_details: ProductDetails,
}

/// Answer of `GET /api/users/{userId}/cart/summary`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub lines: Vec<OrderLine>,
    pub summary: OrderSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub user: RegisteredUser,
}

/// Accepts `"95"`, `95` or null.
fn lenient_product_id<'de, D>(deserializer: D) -> Result<Option<ProductId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .map(|id| Some(ProductId(id)))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid product id {number}"))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid product id {other}"))),
    }
}

/// Accepts integers or integer strings, like a lenient form field.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity {number}"))),
        Some(Value::String(text)) => {
            text.trim().parse::<i64>().map(Some).map_err(serde::de::Error::custom)
        }
        Some(other) => Err(serde::de::Error::custom(format!("invalid quantity {other}"))),
    }
}
