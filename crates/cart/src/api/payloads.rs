//! Wire payloads and the snapshot ingestion boundary.
//!
//! The marketplace API grew out of a loosely typed backend: product fields
//! arrive optional, sometimes absent, occasionally out of range. All of
//! that is resolved *here*, exactly once. [`CartItemPayload::normalize`]
//! turns a raw line into a fully typed [`CartItem`] with every default
//! applied, so no downstream component ever writes another fallback.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use vietmarket_core::{LineItemId, Price, ProductId, Quantity};

use crate::model::{CartItem, ProductSnapshot};
use crate::repository::CartSummary;

/// Standard `{success, data, message}` response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for quantity updates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateQuantityBody {
    pub quantity: Quantity,
}

/// Raw cart line as the server sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
    #[serde(default)]
    pub product: Option<ProductPayload>,
}

/// Raw product fields; everything optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub stock_quantity: Option<Decimal>,
    #[serde(default)]
    pub minimum_quantity: Option<Decimal>,
}

/// Raw badge summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummaryPayload {
    #[serde(default)]
    pub item_count: Option<Decimal>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

impl CartItemPayload {
    /// Normalize a raw line into the fully typed model.
    ///
    /// Missing product fields resolve to their defaults; negative decimals
    /// clamp to zero with a warning. Zero stock/minimum keep their
    /// "untracked"/"no minimum" meaning from the server contract.
    #[must_use]
    pub fn normalize(self) -> CartItem {
        let product = self.product.unwrap_or_default();

        CartItem {
            id: LineItemId::new(self.id),
            product_id: ProductId::new(self.product_id),
            quantity: non_negative("quantity", self.id, self.quantity),
            product: ProductSnapshot {
                name: product
                    .name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "Sản phẩm".to_string()),
                unit_price: Price::vnd(product.price.unwrap_or_default().max(Decimal::ZERO)),
                unit: product
                    .unit
                    .filter(|unit| !unit.is_empty())
                    .unwrap_or_else(|| "kg".to_string()),
                seller_name: product
                    .seller_name
                    .filter(|seller| !seller.is_empty())
                    .unwrap_or_else(|| "Người bán".to_string()),
                store_name: product.store_name.unwrap_or_default(),
                is_available: product.is_available.unwrap_or(true),
                stock_quantity: non_negative(
                    "stockQuantity",
                    self.id,
                    product.stock_quantity.unwrap_or_default(),
                ),
                minimum_quantity: non_negative(
                    "minimumQuantity",
                    self.id,
                    product.minimum_quantity.unwrap_or_default(),
                ),
            },
        }
    }
}

impl CartSummaryPayload {
    /// Normalize a raw badge summary.
    #[must_use]
    pub fn normalize(self) -> CartSummary {
        CartSummary {
            item_count: Quantity::new(self.item_count.unwrap_or_default())
                .unwrap_or(Quantity::ZERO),
            total_price: Price::vnd(self.total_price.unwrap_or_default().max(Decimal::ZERO)),
        }
    }
}

/// Clamp a wire decimal into a non-negative quantity, warning on clamps.
fn non_negative(field: &str, line: i64, value: Decimal) -> Quantity {
    Quantity::new(value).unwrap_or_else(|_| {
        warn!(field, line, %value, "negative value from cart API clamped to zero");
        Quantity::ZERO
    })
}
