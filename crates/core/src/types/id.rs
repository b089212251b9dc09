//! Newtype document IDs for type-safe entity references.
//!
//! The backend addresses every document by an opaque string key (auto-generated
//! for most collections, the auth UID for per-user documents). Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different collections.

/// Error returned when an ID is empty or contains a path separator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID is empty or whitespace only.
    #[error("id cannot be empty")]
    Empty,
    /// The ID contains `/`, which would address a different document path.
    #[error("id cannot contain '/'")]
    ContainsSlash,
    /// The ID is `.` or `..`, which resolve to a parent path.
    #[error("id cannot be '.' or '..'")]
    DotSegment,
}

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as the bare key; `Deserialize` goes through `parse()` so
///   keys arriving in paths or request bodies cannot escape their collection
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Constructors: `new()` (unchecked) and `parse()` (validated)
/// - `as_str()`, `Display`, `From<String>`, `From<&str>`
///
/// # Example
///
/// ```rust
/// # use marketplace_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("u1");
/// let order_id = OrderId::new("u1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// assert_eq!(user_id.as_str(), order_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw document key without validation.
            ///
            /// Use this for keys that came back from the backend.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse a document key supplied by a client.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` for empty input, and
            /// `IdError::ContainsSlash` or `IdError::DotSegment` if the key
            /// would escape its collection.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                if trimmed.contains('/') {
                    return Err($crate::IdError::ContainsSlash);
                }
                if trimmed == "." || trimmed == ".." {
                    return Err($crate::IdError::DotSegment);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying document key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the document key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&raw).map_err(::serde::de::Error::custom)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// One per backend collection
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(ReviewId);
define_id!(AddressId);
define_id!(FaqId);
define_id!(FaqCategoryId);
define_id!(ChatMessageId);
define_id!(TransactionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = UserId::parse("  abc123 ").expect("valid id");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ProductId::parse(""), Err(IdError::Empty));
        assert_eq!(ProductId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_path_segments() {
        assert_eq!(
            OrderId::parse("orders/other"),
            Err(IdError::ContainsSlash)
        );
    }

    #[test]
    fn test_parse_rejects_dot_segments() {
        assert_eq!(AddressId::parse(".."), Err(IdError::DotSegment));
        assert_eq!(AddressId::parse(" . "), Err(IdError::DotSegment));
        assert!(AddressId::parse("..a").is_ok());
    }

    #[test]
    fn test_deserialize_rejects_traversal() {
        let err = serde_json::from_str::<AddressId>("\"../../victim/addresses/a1\"")
            .expect_err("slash must be rejected");
        assert!(err.to_string().contains("'/'"));
        assert!(serde_json::from_str::<AddressId>("\"..\"").is_err());
        assert!(serde_json::from_str::<AddressId>("\"\"").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ReviewId::new("r-1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"r-1\"");

        let parsed: ReviewId = serde_json::from_str("\"r-2\"").expect("deserialize");
        assert_eq!(parsed, ReviewId::new("r-2"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AddressId::new("home").to_string(), "home");
    }
}
