//! Wallet types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use marketplace_core::{TransactionId, UserId};

/// A user's stored balance (`wallets/{uid}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// `None` until the first deposit creates the wallet document.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// The implicit wallet of a user who has never deposited.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Decimal::ZERO,
            updated_at: None,
        }
    }
}

/// A balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    /// Positive for credits, negative for debits.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a deposit or payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub wallet: Wallet,
    pub transaction: Transaction,
}
