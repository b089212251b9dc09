//! Account route handlers: profile and order history.
//!
//! All routes require a logged-in user and only ever touch that user's data.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::{Deserialize, Serialize};

use marketplace_core::{OrderId, OrderStatus};

use super::read_upload;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Order, ProfileUpdate, User};
use crate::services::{OrderService, ProfileService};
use crate::state::AppState;

// =============================================================================
// Profile
// =============================================================================

/// The user's profile.
///
/// GET /api/account/profile
///
/// # Errors
///
/// Returns `404` if the profile document is missing.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let profile = ProfileService::new(state.backend())
        .get_profile(&user.id)
        .await?;
    Ok(Json(profile))
}

/// Edit display name and/or phone number.
///
/// PATCH /api/account/profile
///
/// # Errors
///
/// Returns `400` for a blank display name.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let profile = ProfileService::new(state.backend())
        .update_profile(&user.id, update)
        .await?;
    Ok(Json(profile))
}

/// Response carrying an uploaded file's URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
}

/// Upload a new avatar (multipart field `file`).
///
/// POST /api/account/profile/avatar
///
/// # Errors
///
/// Returns `400` for a missing or non-image file and `413` when too large.
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let (bytes, content_type) = read_upload(multipart).await?;
    let url = ProfileService::new(state.backend())
        .upload_avatar(&user.id, bytes, &content_type)
        .await?;
    Ok(Json(UploadResponse { url }))
}

// =============================================================================
// Orders
// =============================================================================

/// Order list filter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

/// The user's orders, newest first.
///
/// GET /api/account/orders?status=
///
/// # Errors
///
/// Returns `AppError::Repository` if the orders cannot be read.
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.backend())
        .list_orders(&user.id, query.status)
        .await?;
    Ok(Json(orders))
}

/// One of the user's orders.
///
/// GET /api/account/orders/{id}
///
/// # Errors
///
/// Returns `404` if the order does not exist or is someone else's.
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.backend())
        .get_order(&user.id, &id)
        .await?;
    Ok(Json(order))
}
