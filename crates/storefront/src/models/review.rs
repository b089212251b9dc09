//! Product review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{OrderId, OrderStatus, ProductId, Rating, ReviewId, ReviewStatus, UserId};

use super::order::OrderItem;

/// A review of a purchased product (`reviews/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// The order the product was bought in.
    pub order_id: OrderId,
    pub rating: Rating,
    pub comment: String,
    /// Image download URLs.
    pub images: Vec<String>,
    /// "Was this helpful?" yes votes.
    pub helpful: u32,
    /// "Was this helpful?" no votes.
    pub not_helpful: u32,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: ProductId,
    pub order_id: OrderId,
    /// Raw star count; validated into a `Rating`.
    pub rating: i64,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Editable review fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Rating statistics for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Arithmetic mean, 0 when there are no reviews.
    pub average: f64,
    pub count: u32,
    /// Review counts for 1 through 5 stars.
    pub distribution: [u32; 5],
}

impl ReviewSummary {
    /// Summarize a set of ratings.
    #[must_use]
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut summary = Self::default();
        let mut total: u32 = 0;

        for rating in ratings {
            let stars = rating.stars();
            total += u32::from(stars);
            summary.count += 1;
            if let Some(bucket) = summary.distribution.get_mut(usize::from(stars) - 1) {
                *bucket += 1;
            }
        }

        if summary.count > 0 {
            summary.average = f64::from(total) / f64::from(summary.count);
        }
        summary
    }
}

/// A product page's reviews with their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

/// A delivered order with the line items the user has not reviewed yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Never empty.
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ratings(values: &[i64]) -> Vec<Rating> {
        values.iter().map(|&v| Rating::new(v).unwrap()).collect()
    }

    #[test]
    fn test_summary_of_no_ratings() {
        let summary = ReviewSummary::from_ratings(Vec::new());
        assert_eq!(summary.count, 0);
        assert!(summary.average.abs() < f64::EPSILON);
        assert_eq!(summary.distribution, [0; 5]);
    }

    #[test]
    fn test_summary_mean_and_distribution() {
        let summary = ReviewSummary::from_ratings(ratings(&[5, 4, 4, 1]));
        assert_eq!(summary.count, 4);
        assert!((summary.average - 3.5).abs() < f64::EPSILON);
        assert_eq!(summary.distribution, [1, 0, 0, 2, 1]);
    }

    #[test]
    fn test_summary_mean_is_not_rounded() {
        let summary = ReviewSummary::from_ratings(ratings(&[5, 4, 4]));
        assert!((summary.average - 13.0 / 3.0).abs() < 1e-12);
    }
}
