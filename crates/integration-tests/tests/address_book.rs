//! Integration tests for default address bookkeeping.
//!
//! Whatever sequence of adds, edits, deletes and default switches a user
//! performs, the address book holds at most one default, and exactly one
//! whenever the default was never deleted.

use marketplace_core::{AddressId, UserId};
use marketplace_integration_tests::address;
use marketplace_storefront::backend::Backend;
use marketplace_storefront::models::{Address, AddressQuery};
use marketplace_storefront::services::{AddressError, AddressService};

async fn defaults(service: &AddressService<'_>, user: &UserId) -> Vec<Address> {
    service
        .list(user, &AddressQuery::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.is_default)
        .collect()
}

// =============================================================================
// Default Invariant
// =============================================================================

#[tokio::test]
async fn test_single_default_across_operation_sequence() {
    let backend = Backend::in_memory();
    let service = AddressService::new(&backend);
    let user = UserId::new("shopper");

    let home = service.add(&user, address("Home", false)).await.unwrap();
    assert!(home.is_default, "first address becomes the default");

    let work = service.add(&user, address("Work", true)).await.unwrap();
    let cabin = service.add(&user, address("Cabin", false)).await.unwrap();
    assert_eq!(defaults(&service, &user).await.len(), 1);

    service.set_default(&user, &cabin.id).await.unwrap();
    let current = defaults(&service, &user).await;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, cabin.id);

    service
        .update(&user, &home.id, address("Home again", true))
        .await
        .unwrap();
    let current = defaults(&service, &user).await;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, home.id);

    service.delete(&user, &work.id).await.unwrap();
    assert_eq!(defaults(&service, &user).await.len(), 1);

    // Deleting the default leaves none rather than picking a replacement
    service.delete(&user, &home.id).await.unwrap();
    assert!(defaults(&service, &user).await.is_empty());

    service.set_default(&user, &cabin.id).await.unwrap();
    assert_eq!(defaults(&service, &user).await.len(), 1);
}

#[tokio::test]
async fn test_default_listed_first() {
    let backend = Backend::in_memory();
    let service = AddressService::new(&backend);
    let user = UserId::new("shopper");

    service.add(&user, address("Alpha", false)).await.unwrap();
    let beta = service.add(&user, address("Beta", false)).await.unwrap();
    service.set_default(&user, &beta.id).await.unwrap();

    let listed = service
        .list(&user, &AddressQuery::default())
        .await
        .unwrap();
    assert_eq!(listed[0].id, beta.id);
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_users_do_not_share_defaults() {
    let backend = Backend::in_memory();
    let service = AddressService::new(&backend);
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");

    service.add(&alice, address("Alice", false)).await.unwrap();
    service.add(&bob, address("Bob", false)).await.unwrap();
    service.add(&bob, address("Bob 2", true)).await.unwrap();

    assert_eq!(defaults(&service, &alice).await.len(), 1);
    assert_eq!(defaults(&service, &bob).await.len(), 1);
}

// =============================================================================
// Failure Modes
// =============================================================================

#[tokio::test]
async fn test_rejected_edit_leaves_default_untouched() {
    let backend = Backend::in_memory();
    let service = AddressService::new(&backend);
    let user = UserId::new("shopper");

    let home = service.add(&user, address("Home", false)).await.unwrap();
    let mut bad = address("Broken", true);
    bad.latitude = Some(120.0);

    let err = service.add(&user, bad).await.unwrap_err();
    assert!(matches!(err, AddressError::InvalidLatitude));

    let current = defaults(&service, &user).await;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, home.id);
}

#[tokio::test]
async fn test_set_default_on_missing_address() {
    let backend = Backend::in_memory();
    let service = AddressService::new(&backend);
    let user = UserId::new("shopper");

    let home = service.add(&user, address("Home", false)).await.unwrap();
    let err = service
        .set_default(&user, &AddressId::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, AddressError::NotFound));

    let current = defaults(&service, &user).await;
    assert_eq!(current[0].id, home.id);
}
