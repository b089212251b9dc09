//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use marketplace_core::{OrderId, OrderStatus, ProductId, UserId};

/// A placed order (`orders/{id}`). Read-only from the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Buyer who placed the order.
    pub user_id: UserId,
    /// Human-facing order number.
    pub order_number: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether any line item refers to `product_id`.
    #[must_use]
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Product name at the time of purchase.
    pub name: String,
    /// Unit price at the time of purchase.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}
