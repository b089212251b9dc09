//! Status and role enums stored as lowercase strings in backend documents.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown status string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from a single variant table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The value as stored in the backend.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
///
/// Orders are written by checkout and fulfillment outside this codebase;
/// the storefront only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether line items of an order in this status may be reviewed.
    #[must_use]
    pub const fn is_reviewable(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Marketplace account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Buyer,
    Seller,
}

string_enum!(UserRole, "user role", {
    Buyer => "buyer",
    Seller => "seller",
});

/// Support chat thread status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatThreadStatus {
    #[default]
    Active,
    Closed,
}

string_enum!(ChatThreadStatus, "chat status", {
    Active => "active",
    Closed => "closed",
});

/// Review visibility status.
///
/// Only `active` reviews are listed and counted in product ratings. Reviews
/// moderated outside this service carry some other status and drop out of
/// listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Active,
}

string_enum!(ReviewStatus, "review status", {
    Active => "active",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_only_delivered_is_reviewable() {
        assert!(OrderStatus::Delivered.is_reviewable());
        assert!(!OrderStatus::Shipped.is_reviewable());
        assert!(!OrderStatus::Cancelled.is_reviewable());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Seller).unwrap(),
            "\"seller\""
        );
        assert_eq!(
            serde_json::from_str::<ChatThreadStatus>("\"closed\"").unwrap(),
            ChatThreadStatus::Closed
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "admin".parse::<UserRole>().unwrap_err();
        assert_eq!(err.to_string(), "invalid user role: admin");
    }
}
