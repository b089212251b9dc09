//! Review repository (`reviews`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use marketplace_core::{OrderId, ProductId, Rating, ReviewId, ReviewStatus, UserId};

use super::{
    RepositoryError, collections, decode, fields, format_timestamp, now, timestamp, to_fields,
};
use crate::backend::{CollectionPath, Direction, DocumentSnapshot, DocumentStore, Query};
use crate::models::review::Review;

// =============================================================================
// Stored Document
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewDocument {
    user_id: String,
    product_id: String,
    order_id: String,
    rating: Rating,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    helpful: u32,
    #[serde(default)]
    not_helpful: u32,
    #[serde(default)]
    status: ReviewStatus,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

fn into_review(snapshot: &DocumentSnapshot) -> Result<Review, RepositoryError> {
    let doc: ReviewDocument = decode(snapshot)?;
    Ok(Review {
        id: ReviewId::new(snapshot.id.clone()),
        user_id: UserId::new(doc.user_id),
        product_id: ProductId::new(doc.product_id),
        order_id: OrderId::new(doc.order_id),
        rating: doc.rating,
        comment: doc.comment,
        images: doc.images,
        helpful: doc.helpful,
        not_helpful: doc.not_helpful,
        status: doc.status,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

/// Fields of a review about to be inserted.
#[derive(Debug, Clone)]
pub struct ReviewDraft<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
    pub order_id: &'a OrderId,
    pub rating: Rating,
    pub comment: &'a str,
    pub images: &'a [String],
}

/// Changes to an existing review; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges<'a> {
    pub rating: Option<Rating>,
    pub comment: Option<&'a str>,
    pub images: Option<&'a [String]>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn collection() -> CollectionPath {
        CollectionPath::root(collections::REVIEWS)
    }

    fn collect(snapshots: &[DocumentSnapshot]) -> Result<Vec<Review>, RepositoryError> {
        snapshots.iter().map(into_review).collect()
    }

    /// Insert a new active review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn create(&self, draft: ReviewDraft<'_>) -> Result<Review, RepositoryError> {
        let now = now();
        let document = ReviewDocument {
            user_id: draft.user_id.as_str().to_owned(),
            product_id: draft.product_id.as_str().to_owned(),
            order_id: draft.order_id.as_str().to_owned(),
            rating: draft.rating,
            comment: draft.comment.to_owned(),
            images: draft.images.to_vec(),
            helpful: 0,
            not_helpful: 0,
            status: ReviewStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let id = self
            .store
            .add(&Self::collection(), to_fields(&document)?)
            .await?;

        Ok(Review {
            id: ReviewId::new(id),
            user_id: draft.user_id.clone(),
            product_id: draft.product_id.clone(),
            order_id: draft.order_id.clone(),
            rating: document.rating,
            comment: document.comment,
            images: document.images,
            helpful: 0,
            not_helpful: 0,
            status: ReviewStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        match self.store.get(&Self::collection().doc(id.as_str())).await? {
            Some(snapshot) => Ok(Some(into_review(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Whether the user already reviewed this product from this order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn exists(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        order_id: &OrderId,
    ) -> Result<bool, RepositoryError> {
        let query = Query::new(Self::collection())
            .where_eq("userId", user_id.as_str())
            .where_eq("productId", product_id.as_str())
            .where_eq("orderId", order_id.as_str())
            .limit(1);

        Ok(!self.store.query(&query).await?.is_empty())
    }

    /// Active reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn active_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let query = Query::new(Self::collection())
            .where_eq("productId", product_id.as_str())
            .where_eq("status", ReviewStatus::Active.as_str())
            .order_by("createdAt", Direction::Descending);

        Self::collect(&self.store.query(&query).await?)
    }

    /// Reviews written by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn for_user(&self, user_id: &UserId) -> Result<Vec<Review>, RepositoryError> {
        let query = Query::new(Self::collection())
            .where_eq("userId", user_id.as_str())
            .order_by("createdAt", Direction::Descending);

        Self::collect(&self.store.query(&query).await?)
    }

    /// Apply edits and bump `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn update(
        &self,
        id: &ReviewId,
        changes: &ReviewChanges<'_>,
    ) -> Result<(), RepositoryError> {
        let mut data = fields(json!({ "updatedAt": format_timestamp(&now()) }));
        if let Some(rating) = changes.rating {
            data.insert("rating".into(), json!(rating.stars()));
        }
        if let Some(comment) = changes.comment {
            data.insert("comment".into(), json!(comment));
        }
        if let Some(images) = changes.images {
            data.insert("images".into(), json!(images));
        }

        self.store
            .update(&Self::collection().doc(id.as_str()), data)
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Overwrite the vote counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn set_votes(
        &self,
        id: &ReviewId,
        helpful: u32,
        not_helpful: u32,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::collection().doc(id.as_str()),
                fields(json!({ "helpful": helpful, "notHelpful": not_helpful })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete fails.
    pub async fn delete(&self, id: &ReviewId) -> Result<(), RepositoryError> {
        self.store
            .delete(&Self::collection().doc(id.as_str()))
            .await?;
        Ok(())
    }
}
