//! Address book service.
//!
//! At most one address per user is the default. Making an address the
//! default first clears the flag on every other address, then sets it on the
//! target; the steps are separate writes and the first failure is returned.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::{info, instrument};

use marketplace_core::{AddressId, UserId};

use crate::backend::Backend;
use crate::db::{AddressRepository, RepositoryError};
use crate::models::{Address, AddressInput, AddressQuery};

/// Errors that can occur during address book operations.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("latitude must be between -90 and 90")]
    InvalidLatitude,

    #[error("longitude must be between -180 and 180")]
    InvalidLongitude,

    #[error("address not found")]
    NotFound,

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AddressError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Trim the text fields and check required fields and coordinates.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate(input: AddressInput) -> Result<AddressInput, AddressError> {
    let trimmed = |s: String| s.trim().to_owned();
    let input = AddressInput {
        full_name: trimmed(input.full_name),
        phone_number: trimmed(input.phone_number),
        address_line1: trimmed(input.address_line1),
        address_line2: input
            .address_line2
            .map(trimmed)
            .filter(|line| !line.is_empty()),
        city: trimmed(input.city),
        state: trimmed(input.state),
        postal_code: trimmed(input.postal_code),
        country: trimmed(input.country),
        ..input
    };

    for (name, value) in [
        ("fullName", &input.full_name),
        ("addressLine1", &input.address_line1),
        ("city", &input.city),
        ("country", &input.country),
    ] {
        if value.is_empty() {
            return Err(AddressError::MissingField(name));
        }
    }

    if input
        .latitude
        .is_some_and(|lat| !(-90.0..=90.0).contains(&lat))
    {
        return Err(AddressError::InvalidLatitude);
    }
    if input
        .longitude
        .is_some_and(|lng| !(-180.0..=180.0).contains(&lng))
    {
        return Err(AddressError::InvalidLongitude);
    }

    Ok(input)
}

/// Default first, then newest first.
fn display_order(a: &Address, b: &Address) -> Ordering {
    b.is_default
        .cmp(&a.is_default)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Address book service.
pub struct AddressService<'a> {
    addresses: AddressRepository<'a>,
}

impl<'a> AddressService<'a> {
    /// Create a new address service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            addresses: AddressRepository::new(backend.documents.as_ref()),
        }
    }

    /// The user's addresses, default first, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: &UserId,
        query: &AddressQuery,
    ) -> Result<Vec<Address>, AddressError> {
        let mut addresses = self.addresses.list(user_id).await?;

        if let Some(needle) = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        {
            addresses.retain(|a| a.matches(&needle));
        }

        addresses.sort_by(display_order);
        Ok(addresses)
    }

    /// One address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &UserId, id: &AddressId) -> Result<Address, AddressError> {
        self.addresses
            .get(user_id, id)
            .await?
            .ok_or(AddressError::NotFound)
    }

    /// Save a new address. The user's first address always becomes the
    /// default.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input.
    #[instrument(skip(self, input))]
    pub async fn add(
        &self,
        user_id: &UserId,
        input: AddressInput,
    ) -> Result<Address, AddressError> {
        let mut input = validate(input)?;
        let existing = self.addresses.list(user_id).await?;
        if existing.is_empty() {
            input.is_default = true;
        }

        let address = self.addresses.create(user_id, &input).await?;
        if address.is_default {
            self.clear_other_defaults(user_id, &address.id, &existing)
                .await?;
        }

        info!(address_id = %address.id, is_default = address.is_default, "Address added");
        Ok(address)
    }

    /// Replace an address. Passing `isDefault: true` makes it the default.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if it does not exist.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: &UserId,
        id: &AddressId,
        input: AddressInput,
    ) -> Result<Address, AddressError> {
        let input = validate(input)?;
        if input.is_default {
            let existing = self.addresses.list(user_id).await?;
            if !existing.iter().any(|a| &a.id == id) {
                return Err(AddressError::NotFound);
            }
            self.clear_other_defaults(user_id, id, &existing).await?;
        }

        Ok(self.addresses.update(user_id, id, &input).await?)
    }

    /// Delete an address. Deleting the default leaves the user without one.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &UserId, id: &AddressId) -> Result<(), AddressError> {
        self.get(user_id, id).await?;
        self.addresses.delete(user_id, id).await?;
        info!(address_id = %id, "Address deleted");
        Ok(())
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        user_id: &UserId,
        id: &AddressId,
    ) -> Result<Address, AddressError> {
        let existing = self.addresses.list(user_id).await?;
        if !existing.iter().any(|a| &a.id == id) {
            return Err(AddressError::NotFound);
        }

        self.clear_other_defaults(user_id, id, &existing).await?;
        self.addresses.set_default_flag(user_id, id, true).await?;
        self.get(user_id, id).await
    }

    async fn clear_other_defaults(
        &self,
        user_id: &UserId,
        keep: &AddressId,
        addresses: &[Address],
    ) -> Result<(), AddressError> {
        for address in addresses.iter().filter(|a| a.is_default && &a.id != keep) {
            self.addresses
                .set_default_flag(user_id, &address.id, false)
                .await?;
        }
        Ok(())
    }
}
