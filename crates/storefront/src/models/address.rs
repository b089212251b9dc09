//! Address book types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::AddressId;

/// A saved delivery address (`users/{uid}/addresses/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub full_name: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// Pin dropped on the map picker.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Case-insensitive substring match over the text fields.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        [
            Some(self.full_name.as_str()),
            Some(self.address_line1.as_str()),
            self.address_line2.as_deref(),
            Some(self.city.as_str()),
            Some(self.state.as_str()),
            Some(self.postal_code.as_str()),
            Some(self.country.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Address fields supplied by the user on create or edit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub full_name: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: bool,
}

/// Address list options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressQuery {
    pub search: Option<String>,
}
