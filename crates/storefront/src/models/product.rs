//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketplace_core::{ProductId, UserId};

/// A catalog product (`products/{id}`).
///
/// `rating` and `review_count` are maintained by review aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    pub images: Vec<String>,
    pub seller_id: Option<UserId>,
    pub stock: u32,
    /// Mean of active review ratings, 0 when unreviewed.
    pub rating: f64,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Newest first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    /// Highest rated first.
    Rating,
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub sort: ProductSort,
}
