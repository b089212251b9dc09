//! User profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{Email, UserId, UserRole};

/// A marketplace user profile (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth UID.
    pub id: UserId,
    /// Name shown on reviews and in chat.
    pub display_name: String,
    /// Account email.
    pub email: Email,
    /// Whether the auth provider has verified the email.
    pub email_verified: bool,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Buyer or seller.
    pub role: UserRole,
    /// Avatar download URL.
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.phone_number.is_none()
    }
}
