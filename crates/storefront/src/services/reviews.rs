//! Product review service.
//!
//! Reviews are tied to a delivered order: a user may review each product once
//! per order it was bought in. After every add, edit or delete the product's
//! `rating` and `reviewCount` are recomputed from its active reviews.

use thiserror::Error;
use tracing::{info, instrument, warn};

use marketplace_core::{ProductId, Rating, RatingError, ReviewId, UserId};

use super::uploads::{self, ImageFolder, UploadError};
use crate::backend::{Backend, FileStorage};
use crate::db::reviews::{ReviewChanges, ReviewDraft};
use crate::db::{OrderRepository, ProductRepository, RepositoryError, ReviewRepository};
use crate::models::{
    NewReview, OrderItem, ProductReviews, Review, ReviewSummary, ReviewUpdate, ReviewableOrder,
};

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    InvalidRating(#[from] RatingError),

    #[error("review comment cannot be empty")]
    EmptyComment,

    #[error("order not found")]
    OrderNotFound,

    #[error("order has not been delivered")]
    OrderNotDelivered,

    #[error("product is not part of this order")]
    ProductNotInOrder,

    #[error("product already reviewed for this order")]
    AlreadyReviewed,

    #[error("review not found")]
    NotFound,

    #[error("review belongs to another user")]
    NotOwner,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ReviewError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Review service.
pub struct ReviewService<'a> {
    reviews: ReviewRepository<'a>,
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    files: &'a dyn FileStorage,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        let store = backend.documents.as_ref();
        Self {
            reviews: ReviewRepository::new(store),
            orders: OrderRepository::new(store),
            products: ProductRepository::new(store),
            files: backend.files.as_ref(),
        }
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Review a product from one of the user's delivered orders.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` or `ReviewError::EmptyComment`
    /// for bad input, `ReviewError::OrderNotFound`,
    /// `ReviewError::OrderNotDelivered` or `ReviewError::ProductNotInOrder`
    /// if the order does not qualify, and `ReviewError::AlreadyReviewed` for a
    /// duplicate.
    #[instrument(skip(self, input), fields(product_id = %input.product_id, order_id = %input.order_id))]
    pub async fn add_review(
        &self,
        user_id: &UserId,
        input: NewReview,
    ) -> Result<Review, ReviewError> {
        let rating = Rating::new(input.rating)?;
        let comment = input.comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        let order = self
            .orders
            .get(&input.order_id)
            .await?
            .filter(|order| &order.user_id == user_id)
            .ok_or(ReviewError::OrderNotFound)?;
        if !order.status.is_reviewable() {
            return Err(ReviewError::OrderNotDelivered);
        }
        if !order.contains_product(&input.product_id) {
            return Err(ReviewError::ProductNotInOrder);
        }
        if self
            .reviews
            .exists(user_id, &input.product_id, &input.order_id)
            .await?
        {
            return Err(ReviewError::AlreadyReviewed);
        }

        let review = self
            .reviews
            .create(ReviewDraft {
                user_id,
                product_id: &input.product_id,
                order_id: &input.order_id,
                rating,
                comment,
                images: &input.images,
            })
            .await?;
        info!(review_id = %review.id, stars = rating.stars(), "Review added");

        self.aggregate(&review.product_id).await?;
        Ok(review)
    }

    /// Edit one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the review does not exist and
    /// `ReviewError::NotOwner` if someone else wrote it.
    #[instrument(skip(self, update))]
    pub async fn update_review(
        &self,
        user_id: &UserId,
        review_id: &ReviewId,
        update: ReviewUpdate,
    ) -> Result<Review, ReviewError> {
        let rating = update.rating.map(Rating::new).transpose()?;
        let comment = update.comment.as_deref().map(str::trim);
        if comment == Some("") {
            return Err(ReviewError::EmptyComment);
        }

        let review = self.owned(user_id, review_id).await?;
        self.reviews
            .update(
                review_id,
                &ReviewChanges {
                    rating,
                    comment,
                    images: update.images.as_deref(),
                },
            )
            .await?;

        self.aggregate(&review.product_id).await?;
        self.reviews
            .get(review_id)
            .await?
            .ok_or(ReviewError::NotFound)
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the review does not exist and
    /// `ReviewError::NotOwner` if someone else wrote it.
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        user_id: &UserId,
        review_id: &ReviewId,
    ) -> Result<(), ReviewError> {
        let review = self.owned(user_id, review_id).await?;
        self.reviews.delete(review_id).await?;
        info!(%review_id, "Review deleted");

        self.aggregate(&review.product_id).await
    }

    /// Count a "was this helpful?" vote.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the review does not exist.
    #[instrument(skip(self))]
    pub async fn vote(&self, review_id: &ReviewId, helpful: bool) -> Result<Review, ReviewError> {
        let mut review = self
            .reviews
            .get(review_id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        if helpful {
            review.helpful = review.helpful.saturating_add(1);
        } else {
            review.not_helpful = review.not_helpful.saturating_add(1);
        }
        self.reviews
            .set_votes(review_id, review.helpful, review.not_helpful)
            .await?;

        Ok(review)
    }

    /// Upload a photo to attach to a review and return its URL.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Upload` if the file is rejected or the upload
    /// fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_review_image(
        &self,
        user_id: &UserId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ReviewError> {
        Ok(uploads::upload_image(
            self.files,
            ImageFolder::Reviews,
            user_id,
            bytes,
            content_type,
        )
        .await?)
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Active reviews of a product, newest first, with their summary.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductReviews, ReviewError> {
        let reviews = self.reviews.active_for_product(product_id).await?;
        let summary = ReviewSummary::from_ratings(reviews.iter().map(|r| r.rating));
        Ok(ProductReviews { summary, reviews })
    }

    /// Reviews written by the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn user_reviews(&self, user_id: &UserId) -> Result<Vec<Review>, ReviewError> {
        Ok(self.reviews.for_user(user_id).await?)
    }

    /// Delivered orders with the products the user has not reviewed yet.
    ///
    /// Issues one existence query per line item. Orders with nothing left to
    /// review are omitted.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` if any query fails.
    #[instrument(skip(self))]
    pub async fn reviewable_items(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReviewableOrder>, ReviewError> {
        let orders = self.orders.list_for_user(user_id, None).await?;
        let mut reviewable = Vec::new();

        for order in orders.into_iter().filter(|o| o.status.is_reviewable()) {
            let mut items: Vec<OrderItem> = Vec::new();
            for item in order.items {
                // The same product may appear on several lines
                if items.iter().any(|i| i.product_id == item.product_id) {
                    continue;
                }
                if !self
                    .reviews
                    .exists(user_id, &item.product_id, &order.id)
                    .await?
                {
                    items.push(item);
                }
            }

            if !items.is_empty() {
                reviewable.push(ReviewableOrder {
                    order_id: order.id,
                    order_number: order.order_number,
                    status: order.status,
                    created_at: order.created_at,
                    items,
                });
            }
        }

        Ok(reviewable)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn owned(&self, user_id: &UserId, review_id: &ReviewId) -> Result<Review, ReviewError> {
        let review = self
            .reviews
            .get(review_id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        if &review.user_id != user_id {
            return Err(ReviewError::NotOwner);
        }
        Ok(review)
    }

    /// Recompute the product's rating from its active reviews.
    async fn aggregate(&self, product_id: &ProductId) -> Result<(), ReviewError> {
        let reviews = self.reviews.active_for_product(product_id).await?;
        let summary = ReviewSummary::from_ratings(reviews.iter().map(|r| r.rating));

        match self
            .products
            .set_rating(product_id, summary.average, summary.count)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => {
                warn!(%product_id, "Reviewed product no longer exists, rating not stored");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
