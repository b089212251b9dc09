//! Document-store repositories.
//!
//! # Collections
//!
//! - `users/{uid}` - Profiles (keyed by auth UID)
//! - `users/{uid}/addresses` - Address book
//! - `orders` - Placed orders (written by checkout, read here)
//! - `products` - Catalog, with aggregated `rating`/`reviewCount`
//! - `reviews` - Product reviews
//! - `supportChats/{uid}` + `messages` - Support chat threads
//! - `faqs`, `faqCategories` - Help center content
//! - `wallets/{uid}` + `transactions` - Stored balance and its history
//!
//! Each repository keeps a private document type mirroring the stored camelCase
//! layout and converts it into the matching `crate::models` type.

pub mod addresses;
pub mod chat;
pub mod faq;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wallet;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::backend::{BackendError, DocumentSnapshot, Fields};

pub use addresses::AddressRepository;
pub use chat::ChatRepository;
pub use faq::FaqRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use wallet::WalletRepository;

/// Top-level collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ADDRESSES: &str = "addresses";
    pub const ORDERS: &str = "orders";
    pub const PRODUCTS: &str = "products";
    pub const REVIEWS: &str = "reviews";
    pub const SUPPORT_CHATS: &str = "supportChats";
    pub const MESSAGES: &str = "messages";
    pub const FAQS: &str = "faqs";
    pub const FAQ_CATEGORIES: &str = "faqCategories";
    pub const WALLETS: &str = "wallets";
    pub const TRANSACTIONS: &str = "transactions";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stored document does not have the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// A document with this key already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Turn a backend `NotFound` into `RepositoryError::NotFound`.
    ///
    /// Used for field updates, where a missing document is a caller error
    /// rather than a platform failure.
    fn missing_as_not_found(error: BackendError) -> Self {
        match error {
            BackendError::NotFound(_) => Self::NotFound,
            other => Self::Backend(other),
        }
    }
}

/// Serialize a document type into stored fields.
fn to_fields<T: Serialize>(document: &T) -> Result<Fields, RepositoryError> {
    match serde_json::to_value(document) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(RepositoryError::DataCorruption(format!(
            "document serialized to non-object: {other}"
        ))),
        Err(e) => Err(RepositoryError::DataCorruption(e.to_string())),
    }
}

/// Deserialize stored fields into a document type.
fn decode<T: DeserializeOwned>(snapshot: &DocumentSnapshot) -> Result<T, RepositoryError> {
    snapshot
        .decode()
        .map_err(|e| RepositoryError::DataCorruption(format!("document {}: {e}", snapshot.id)))
}

/// Build a field map from a `json!` object literal.
fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Current time at stored precision, so values read back compare equal.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Stored form of a timestamp: RFC 3339, UTC, millisecond precision.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for timestamps stored as RFC 3339 strings.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(value))
    }

    /// Deserialize from an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Fails for anything that is not an RFC 3339 string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    /// Optional variant; pair with `#[serde(default)]`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize `Some` as an RFC 3339 string and `None` as null.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => serializer.serialize_str(&super::super::format_timestamp(ts)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize null or an RFC 3339 string.
        ///
        /// # Errors
        ///
        /// Fails for strings that are not RFC 3339.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|ts| ts.with_timezone(&Utc))
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}
