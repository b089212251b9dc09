//! Catalog route handlers (public).

use axum::{
    Json,
    extract::{Path, Query, State},
};

use marketplace_core::ProductId;

use crate::error::Result;
use crate::models::{Product, ProductFilter, ProductReviews};
use crate::services::{ProductService, ReviewService};
use crate::state::AppState;

/// List products.
///
/// GET /api/products?category=&search=&sort=newest|price_asc|price_desc|rating
///
/// # Errors
///
/// Returns `AppError::Repository` if the catalog cannot be read.
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.backend())
        .list_products(&filter)
        .await?;
    Ok(Json(products))
}

/// Product detail.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns `404` if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.backend()).get_product(&id).await?;
    Ok(Json(product))
}

/// Active reviews with their rating summary.
///
/// GET /api/products/{id}/reviews
///
/// # Errors
///
/// Returns `AppError::Review` if the reviews cannot be read.
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductReviews>> {
    let reviews = ReviewService::new(state.backend())
        .product_reviews(&id)
        .await?;
    Ok(Json(reviews))
}
