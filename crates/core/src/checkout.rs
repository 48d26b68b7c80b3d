use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

pub const EXPRESS_SHIPPING: Money = Money::from_minor_units(1_299);
pub const STANDARD_SHIPPING: Money = Money::from_minor_units(599);
/// Standard shipping is free for subtotals strictly above this amount.
pub const FREE_SHIPPING_OVER: Money = Money::from_minor_units(5_000);
/// Seven percent.
pub const SALES_TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Pickup,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Pickup => "pickup",
        }
    }

    pub fn cost(&self, subtotal: Money) -> Money {
        match self {
            Self::Express => EXPRESS_SHIPPING,
            Self::Standard if subtotal > FREE_SHIPPING_OVER => Money::ZERO,
            Self::Standard => STANDARD_SHIPPING,
            Self::Pickup => Money::ZERO,
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "pickup" => Ok(Self::Pickup),
            _ => Err(DomainError::UnknownLabel { kind: "shipping method", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn for_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_method: ShippingMethod,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Tax applies to the subtotal only, rounded half up to the cent.
    pub fn compute(lines: &[OrderLine], shipping_method: ShippingMethod) -> Self {
        let subtotal = lines.iter().map(OrderLine::total).fold(Money::ZERO, Money::saturating_add);
        let item_count = lines.iter().map(|line| line.quantity).fold(0u32, u32::saturating_add);
        let shipping = shipping_method.cost(subtotal);
        let tax = subtotal.scaled(SALES_TAX_RATE);
        let total = subtotal.saturating_add(shipping).saturating_add(tax);

        Self { item_count, subtotal, shipping_method, shipping, tax, total }
    }
}
