//! Review route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use marketplace_core::ReviewId;

use super::account::UploadResponse;
use super::read_upload;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewReview, Review, ReviewUpdate, ReviewableOrder};
use crate::services::ReviewService;
use crate::state::AppState;

/// Reviews written by the user.
///
/// GET /api/account/reviews
///
/// # Errors
///
/// Returns `AppError::Review` if the reviews cannot be read.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewService::new(state.backend())
        .user_reviews(&user.id)
        .await?;
    Ok(Json(reviews))
}

/// Delivered orders with products still awaiting a review.
///
/// GET /api/account/reviews/reviewable
///
/// # Errors
///
/// Returns `AppError::Review` if orders or reviews cannot be read.
pub async fn reviewable(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ReviewableOrder>>> {
    let orders = ReviewService::new(state.backend())
        .reviewable_items(&user.id)
        .await?;
    Ok(Json(orders))
}

/// Review a purchased product.
///
/// POST /api/account/reviews
///
/// # Errors
///
/// Returns `400`/`422` when the order does not qualify and `409` for a
/// duplicate review.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.backend())
        .add_review(&user.id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit one of the user's reviews.
///
/// PUT /api/account/reviews/{id}
///
/// # Errors
///
/// Returns `403` for someone else's review and `404` if it does not exist.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
    Json(update): Json<ReviewUpdate>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.backend())
        .update_review(&user.id, &id, update)
        .await?;
    Ok(Json(review))
}

/// Delete one of the user's reviews.
///
/// DELETE /api/account/reviews/{id}
///
/// # Errors
///
/// Returns `403` for someone else's review and `404` if it does not exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    ReviewService::new(state.backend())
        .delete_review(&user.id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a review photo (multipart field `file`).
///
/// POST /api/account/reviews/images
///
/// # Errors
///
/// Returns `400` for a missing or non-image file and `413` when too large.
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let (bytes, content_type) = read_upload(multipart).await?;
    let url = ReviewService::new(state.backend())
        .upload_review_image(&user.id, bytes, &content_type)
        .await?;
    Ok(Json(UploadResponse { url }))
}

/// Helpfulness vote.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub helpful: bool,
}

/// Vote on a review.
///
/// POST /api/reviews/{id}/vote
///
/// # Errors
///
/// Returns `404` if the review does not exist.
pub async fn vote(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ReviewId>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.backend())
        .vote(&id, request.helpful)
        .await?;
    Ok(Json(review))
}
