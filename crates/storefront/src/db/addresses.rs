//! Address book repository (`users/{uid}/addresses`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use marketplace_core::{AddressId, UserId};

use super::{
    RepositoryError, collections, decode, fields, format_timestamp, now, timestamp, to_fields,
};
use crate::backend::{CollectionPath, DocumentSnapshot, DocumentStore, Query};
use crate::models::address::{Address, AddressInput};

// =============================================================================
// Stored Document
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressDocument {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    address_line1: String,
    #[serde(default)]
    address_line2: Option<String>,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    is_default: bool,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl AddressDocument {
    fn from_input(
        input: &AddressInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            full_name: input.full_name.clone(),
            phone_number: input.phone_number.clone(),
            address_line1: input.address_line1.clone(),
            address_line2: input.address_line2.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
            is_default: input.is_default,
            created_at,
            updated_at,
        }
    }

    fn into_address(self, id: AddressId) -> Address {
        Address {
            id,
            full_name: self.full_name,
            phone_number: self.phone_number,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            latitude: self.latitude,
            longitude: self.longitude,
            is_default: self.is_default,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn into_address(snapshot: &DocumentSnapshot) -> Result<Address, RepositoryError> {
    let doc: AddressDocument = decode(snapshot)?;
    Ok(doc.into_address(AddressId::new(snapshot.id.clone())))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for a user's saved addresses.
pub struct AddressRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn collection(user_id: &UserId) -> CollectionPath {
        CollectionPath::root(collections::USERS)
            .doc(user_id.as_str())
            .subcollection(collections::ADDRESSES)
    }

    /// Every address of the user, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Address>, RepositoryError> {
        self.store
            .query(&Query::new(Self::collection(user_id)))
            .await?
            .iter()
            .map(into_address)
            .collect()
    }

    /// Get one address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get(
        &self,
        user_id: &UserId,
        id: &AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        match self
            .store
            .get(&Self::collection(user_id).doc(id.as_str()))
            .await?
        {
            Some(snapshot) => Ok(Some(into_address(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Insert an address. `input.is_default` is stored as given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn create(
        &self,
        user_id: &UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let now = now();
        let document = AddressDocument::from_input(input, now, now);
        let id = self
            .store
            .add(&Self::collection(user_id), to_fields(&document)?)
            .await?;

        Ok(document.into_address(AddressId::new(id)))
    }

    /// Replace the editable fields of an address, keeping `createdAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let existing = self.get(user_id, id).await?.ok_or(RepositoryError::NotFound)?;
        let document = AddressDocument::from_input(input, existing.created_at, now());

        let mut data = to_fields(&document)?;
        data.remove("createdAt");
        self.store
            .update(&Self::collection(user_id).doc(id.as_str()), data)
            .await
            .map_err(RepositoryError::missing_as_not_found)?;

        Ok(document.into_address(id.clone()))
    }

    /// Set or clear the default flag of one address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist.
    pub async fn set_default_flag(
        &self,
        user_id: &UserId,
        id: &AddressId,
        is_default: bool,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::collection(user_id).doc(id.as_str()),
                fields(json!({
                    "isDefault": is_default,
                    "updatedAt": format_timestamp(&now()),
                })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the delete fails.
    pub async fn delete(&self, user_id: &UserId, id: &AddressId) -> Result<(), RepositoryError> {
        self.store
            .delete(&Self::collection(user_id).doc(id.as_str()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    fn input(name: &str) -> AddressInput {
        AddressInput {
            full_name: name.into(),
            address_line1: "1 Main St".into(),
            city: "Springfield".into(),
            country: "US".into(),
            ..AddressInput::default()
        }
    }

    #[tokio::test]
    async fn test_addresses_are_scoped_per_user() {
        let store = MemoryDocumentStore::new();
        let repo = AddressRepository::new(&store);
        repo.create(&UserId::new("u1"), &input("Ada")).await.unwrap();
        repo.create(&UserId::new("u2"), &input("Bob")).await.unwrap();

        let listed = repo.list(&UserId::new("u1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].full_name, "Ada");
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let store = MemoryDocumentStore::new();
        let repo = AddressRepository::new(&store);
        let user = UserId::new("u1");
        let created = repo.create(&user, &input("Ada")).await.unwrap();

        let updated = repo
            .update(&user, &created.id, &input("Ada Lovelace"))
            .await
            .unwrap();
        let stored = repo.get(&user, &created.id).await.unwrap().unwrap();

        assert_eq!(stored.full_name, "Ada Lovelace");
        assert_eq!(stored.created_at, created.created_at);
        assert_eq!(updated.created_at, created.created_at);
        assert!(stored.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_address() {
        let store = MemoryDocumentStore::new();
        let repo = AddressRepository::new(&store);
        let err = repo
            .update(&UserId::new("u1"), &AddressId::new("nope"), &input("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
