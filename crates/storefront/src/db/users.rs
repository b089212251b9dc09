//! User profile repository (`users/{uid}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use marketplace_core::{Email, UserId, UserRole};

use super::{
    RepositoryError, collections, decode, fields, format_timestamp, now, timestamp, to_fields,
};
use crate::backend::{CollectionPath, DocumentPath, DocumentSnapshot, DocumentStore};
use crate::models::user::{ProfileUpdate, User};

// =============================================================================
// Stored Document
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(default)]
    display_name: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    role: UserRole,
    #[serde(default, rename = "photoURL")]
    photo_url: Option<String>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
}

fn into_user(snapshot: &DocumentSnapshot) -> Result<User, RepositoryError> {
    let doc: UserDocument = decode(snapshot)?;
    let email = Email::parse(&doc.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in user {}: {e}", snapshot.id))
    })?;

    Ok(User {
        id: UserId::new(snapshot.id.clone()),
        display_name: doc.display_name,
        email,
        email_verified: doc.email_verified,
        phone_number: doc.phone_number,
        role: doc.role,
        photo_url: doc.photo_url,
        created_at: doc.created_at,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user profiles.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn path(id: &UserId) -> DocumentPath {
        CollectionPath::root(collections::USERS).doc(id.as_str())
    }

    /// Get a user by their auth UID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    /// Returns `RepositoryError::DataCorruption` if the stored profile is invalid.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        match self.store.get(&Self::path(id)).await? {
            Some(snapshot) => Ok(Some(into_user(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Create the profile document for a freshly registered account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a profile already exists for `id`.
    /// Returns `RepositoryError::Backend` if a write fails.
    pub async fn create(
        &self,
        id: &UserId,
        email: &Email,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let path = Self::path(id);
        if self.store.get(&path).await?.is_some() {
            return Err(RepositoryError::Conflict(format!("profile {id} exists")));
        }

        let document = UserDocument {
            display_name: display_name.to_owned(),
            email: email.as_str().to_owned(),
            email_verified: false,
            phone_number: None,
            role,
            photo_url: None,
            created_at: now(),
        };
        self.store.set(&path, to_fields(&document)?).await?;

        Ok(User {
            id: id.clone(),
            display_name: document.display_name,
            email: email.clone(),
            email_verified: false,
            phone_number: None,
            role,
            photo_url: None,
            created_at: document.created_at,
        })
    }

    /// Write the editable profile fields that are set in `update`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let mut data = fields(json!({}));
        if let Some(name) = &update.display_name {
            data.insert("displayName".into(), json!(name));
        }
        if let Some(phone) = &update.phone_number {
            data.insert("phoneNumber".into(), json!(phone));
        }
        if data.is_empty() {
            return Ok(());
        }
        data.insert("updatedAt".into(), json!(format_timestamp(&now())));

        self.store
            .update(&Self::path(id), data)
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Point the profile at a new avatar.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_photo_url(&self, id: &UserId, url: &str) -> Result<(), RepositoryError> {
        self.store
            .update(&Self::path(id), fields(json!({ "photoURL": url })))
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Mirror the auth provider's verification flag onto the profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_email_verified(
        &self,
        id: &UserId,
        verified: bool,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(&Self::path(id), fields(json!({ "emailVerified": verified })))
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryDocumentStore::new();
        let users = UserRepository::new(&store);
        let id = UserId::new("u1");
        let email = Email::parse("Ada@Example.com").unwrap();

        users
            .create(&id, &email, "Ada", UserRole::Buyer)
            .await
            .unwrap();
        let user = users.get(&id).await.unwrap().unwrap();

        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.role, UserRole::Buyer);
        assert!(user.photo_url.is_none());
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = MemoryDocumentStore::new();
        let users = UserRepository::new(&store);
        let id = UserId::new("u1");
        let email = Email::parse("ada@example.com").unwrap();

        users.create(&id, &email, "Ada", UserRole::Buyer).await.unwrap();
        let err = users
            .create(&id, &email, "Ada", UserRole::Seller)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_profile() {
        let store = MemoryDocumentStore::new();
        let users = UserRepository::new(&store);
        let update = ProfileUpdate {
            display_name: Some("New".into()),
            phone_number: None,
        };

        let err = users
            .update_profile(&UserId::new("ghost"), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = MemoryDocumentStore::new();
        let users = UserRepository::new(&store);
        let id = UserId::new("u1");
        let email = Email::parse("ada@example.com").unwrap();
        users.create(&id, &email, "Ada", UserRole::Buyer).await.unwrap();

        let update = ProfileUpdate {
            display_name: None,
            phone_number: Some("+1 555 0100".into()),
        };
        users.update_profile(&id, &update).await.unwrap();

        let user = users.get(&id).await.unwrap().unwrap();
        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.phone_number.as_deref(), Some("+1 555 0100"));
    }
}
