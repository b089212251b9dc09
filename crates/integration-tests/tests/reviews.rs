//! Integration tests for review eligibility and rating aggregation.

use marketplace_core::{OrderId, OrderStatus, ProductId, ReviewId, UserId};
use marketplace_integration_tests::{order, product, seed};
use marketplace_storefront::backend::Backend;
use marketplace_storefront::db::ProductRepository;
use marketplace_storefront::models::{NewReview, ReviewUpdate};
use marketplace_storefront::services::{ProductService, ReviewError, ReviewService};

fn review(product: &str, order: &str, rating: i64) -> NewReview {
    NewReview {
        product_id: ProductId::new(product),
        order_id: OrderId::new(order),
        rating,
        comment: "Does the job".to_owned(),
        images: Vec::new(),
    }
}

async fn stored_rating(backend: &Backend, id: &str) -> (f64, u32) {
    let product = ProductRepository::new(backend.documents.as_ref())
        .get(&ProductId::new(id))
        .await
        .unwrap()
        .unwrap();
    (product.rating, product.review_count)
}

// =============================================================================
// Rating Aggregation
// =============================================================================

#[tokio::test]
async fn test_product_rating_tracks_mean_of_reviews() {
    let backend = Backend::in_memory();
    let buyers = ["u1", "u2", "u3"];
    let orders: Vec<_> = buyers
        .iter()
        .map(|u| order(&format!("o-{u}"), u, OrderStatus::Delivered, &["p1"]))
        .collect();
    seed(&backend, &[product("p1", 20)], &orders).await;

    let service = ReviewService::new(&backend);
    let mut ids = Vec::new();
    for (buyer, stars) in buyers.iter().zip([5, 4, 2]) {
        let created = service
            .add_review(&UserId::new(*buyer), review("p1", &format!("o-{buyer}"), stars))
            .await
            .unwrap();
        ids.push(created.id);
    }

    let (rating, count) = stored_rating(&backend, "p1").await;
    assert_eq!(count, 3);
    assert!((rating - 11.0 / 3.0).abs() < 1e-9);

    // Editing a rating re-aggregates
    service
        .update_review(
            &UserId::new("u3"),
            &ids[2],
            ReviewUpdate {
                rating: Some(5),
                ..ReviewUpdate::default()
            },
        )
        .await
        .unwrap();
    let (rating, _) = stored_rating(&backend, "p1").await;
    assert!((rating - 14.0 / 3.0).abs() < 1e-9);

    // So does deleting one
    service.delete_review(&UserId::new("u1"), &ids[0]).await.unwrap();
    let (rating, count) = stored_rating(&backend, "p1").await;
    assert_eq!(count, 2);
    assert!((rating - 4.5).abs() < 1e-9);

    let page = service.product_reviews(&ProductId::new("p1")).await.unwrap();
    assert_eq!(page.summary.count, 2);
    assert!((page.summary.average - rating).abs() < 1e-9);
}

#[tokio::test]
async fn test_rating_resets_when_last_review_removed() {
    let backend = Backend::in_memory();
    seed(
        &backend,
        &[product("p1", 20)],
        &[order("o1", "u1", OrderStatus::Delivered, &["p1"])],
    )
    .await;

    let service = ReviewService::new(&backend);
    let user = UserId::new("u1");
    let created = service.add_review(&user, review("p1", "o1", 3)).await.unwrap();
    service.delete_review(&user, &created.id).await.unwrap();

    assert_eq!(stored_rating(&backend, "p1").await, (0.0, 0));

    let catalog = ProductService::new(&backend);
    let product = catalog.get_product(&ProductId::new("p1")).await.unwrap();
    assert_eq!(product.review_count, 0);
}

// =============================================================================
// Eligibility
// =============================================================================

#[tokio::test]
async fn test_reviewable_never_returns_empty_orders() {
    let backend = Backend::in_memory();
    seed(
        &backend,
        &[product("p1", 5), product("p2", 7), product("p3", 9)],
        &[
            order("o1", "u1", OrderStatus::Delivered, &["p1", "p2"]),
            order("o2", "u1", OrderStatus::Delivered, &["p3"]),
            order("o3", "u1", OrderStatus::Shipped, &["p1"]),
            order("o4", "u1", OrderStatus::Delivered, &[]),
        ],
    )
    .await;

    let service = ReviewService::new(&backend);
    let user = UserId::new("u1");

    let before = service.reviewable_items(&user).await.unwrap();
    let mut ids: Vec<_> = before.iter().map(|o| o.order_id.as_str().to_owned()).collect();
    ids.sort();
    assert_eq!(ids, ["o1", "o2"]);
    assert!(before.iter().all(|o| !o.items.is_empty()));
    assert!(before.iter().all(|o| o.status == OrderStatus::Delivered));

    service.add_review(&user, review("p3", "o2", 4)).await.unwrap();
    service.add_review(&user, review("p1", "o1", 4)).await.unwrap();

    let after = service.reviewable_items(&user).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].order_id, OrderId::new("o1"));
    assert_eq!(after[0].items.len(), 1);
    assert_eq!(after[0].items[0].product_id, ProductId::new("p2"));

    service.add_review(&user, review("p2", "o1", 2)).await.unwrap();
    assert!(service.reviewable_items(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_review_requires_delivered_purchase() {
    let backend = Backend::in_memory();
    seed(
        &backend,
        &[product("p1", 5), product("p2", 5)],
        &[
            order("o1", "u1", OrderStatus::Processing, &["p1"]),
            order("o2", "u1", OrderStatus::Delivered, &["p1"]),
        ],
    )
    .await;

    let service = ReviewService::new(&backend);
    let user = UserId::new("u1");

    let err = service.add_review(&user, review("p1", "o1", 5)).await.unwrap_err();
    assert!(matches!(err, ReviewError::OrderNotDelivered));

    let err = service.add_review(&user, review("p2", "o2", 5)).await.unwrap_err();
    assert!(matches!(err, ReviewError::ProductNotInOrder));

    let err = service
        .add_review(&UserId::new("u2"), review("p1", "o2", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::OrderNotFound));

    service.add_review(&user, review("p1", "o2", 5)).await.unwrap();
    let err = service.add_review(&user, review("p1", "o2", 4)).await.unwrap_err();
    assert!(matches!(err, ReviewError::AlreadyReviewed));
}

#[tokio::test]
async fn test_only_author_may_edit() {
    let backend = Backend::in_memory();
    seed(
        &backend,
        &[product("p1", 5)],
        &[order("o1", "u1", OrderStatus::Delivered, &["p1"])],
    )
    .await;

    let service = ReviewService::new(&backend);
    let created = service
        .add_review(&UserId::new("u1"), review("p1", "o1", 5))
        .await
        .unwrap();

    let err = service
        .delete_review(&UserId::new("u2"), &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotOwner));

    let err = service
        .delete_review(&UserId::new("u1"), &ReviewId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotFound));
}
