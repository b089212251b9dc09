//! Profile service: read and edit the user's own profile.

use thiserror::Error;
use tracing::{info, instrument};

use marketplace_core::UserId;

use super::uploads::{self, ImageFolder, UploadError};
use crate::backend::{Backend, FileStorage};
use crate::db::{RepositoryError, UserRepository};
use crate::models::{ProfileUpdate, User};

/// Errors that can occur during profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,

    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProfileError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Profile service.
pub struct ProfileService<'a> {
    users: UserRepository<'a>,
    files: &'a dyn FileStorage,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            users: UserRepository::new(backend.documents.as_ref()),
            files: backend.files.as_ref(),
        }
    }

    /// Get the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if no profile exists.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &UserId) -> Result<User, ProfileError> {
        self.users.get(user_id).await?.ok_or(ProfileError::NotFound)
    }

    /// Update display name and/or phone number, returning the new profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyDisplayName` for a blank name.
    /// Returns `ProfileError::NotFound` if no profile exists.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, ProfileError> {
        let update = ProfileUpdate {
            display_name: update.display_name.map(|n| n.trim().to_owned()),
            phone_number: update.phone_number.map(|p| p.trim().to_owned()),
        };
        if update.display_name.as_deref() == Some("") {
            return Err(ProfileError::EmptyDisplayName);
        }

        self.users.update_profile(user_id, &update).await?;
        self.get_profile(user_id).await
    }

    /// Upload a new avatar and point the profile at it.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Upload` if the image is rejected or the upload fails.
    /// Returns `ProfileError::NotFound` if no profile exists.
    #[instrument(skip(self, bytes))]
    pub async fn upload_avatar(
        &self,
        user_id: &UserId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ProfileError> {
        // Fail before uploading an orphan file
        self.get_profile(user_id).await?;

        let url = uploads::upload_image(
            self.files,
            ImageFolder::Avatars,
            user_id,
            bytes,
            content_type,
        )
        .await?;
        self.users.set_photo_url(user_id, &url).await?;

        info!(%user_id, "avatar updated");
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Email, UserRole};

    use super::*;

    async fn backend_with_user() -> (Backend, UserId) {
        let backend = Backend::in_memory();
        let id = UserId::new("u1");
        UserRepository::new(backend.documents.as_ref())
            .create(
                &id,
                &Email::parse("ada@example.com").unwrap(),
                "Ada",
                UserRole::Buyer,
            )
            .await
            .unwrap();
        (backend, id)
    }

    #[tokio::test]
    async fn test_update_profile_trims() {
        let (backend, id) = backend_with_user().await;
        let profile = ProfileService::new(&backend)
            .update_profile(
                &id,
                ProfileUpdate {
                    display_name: Some("  Ada L.  ".into()),
                    phone_number: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.display_name, "Ada L.");
    }

    #[tokio::test]
    async fn test_blank_display_name_rejected() {
        let (backend, id) = backend_with_user().await;
        let err = ProfileService::new(&backend)
            .update_profile(
                &id,
                ProfileUpdate {
                    display_name: Some("   ".into()),
                    phone_number: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::EmptyDisplayName));
    }

    #[tokio::test]
    async fn test_upload_avatar_sets_photo_url() {
        let (backend, id) = backend_with_user().await;
        let service = ProfileService::new(&backend);

        let url = service
            .upload_avatar(&id, vec![0xFF, 0xD8, 0xFF], "image/jpeg")
            .await
            .unwrap();

        assert!(url.starts_with("memory://avatars/u1/"));
        let profile = service.get_profile(&id).await.unwrap();
        assert_eq!(profile.photo_url, Some(url));
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let backend = Backend::in_memory();
        let err = ProfileService::new(&backend)
            .get_profile(&UserId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound));
    }
}
