//! Wallet repository (`wallets/{uid}` and its `transactions`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketplace_core::{TransactionId, UserId};

use super::{RepositoryError, collections, decode, now, timestamp, to_fields};
use crate::backend::{
    CollectionPath, Direction, DocumentPath, DocumentSnapshot, DocumentStore, Query,
};
use crate::models::wallet::{Transaction, Wallet};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletDocument {
    #[serde(default, with = "rust_decimal::serde::float")]
    balance: Decimal,
    #[serde(default, with = "timestamp::option")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionDocument {
    #[serde(default)]
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
}

fn into_transaction(snapshot: &DocumentSnapshot) -> Result<Transaction, RepositoryError> {
    let doc: TransactionDocument = decode(snapshot)?;
    Ok(Transaction {
        id: TransactionId::new(snapshot.id.clone()),
        description: doc.description,
        amount: doc.amount,
        timestamp: doc.timestamp,
    })
}

/// Repository for wallets and their ledgers.
pub struct WalletRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn path(user_id: &UserId) -> DocumentPath {
        CollectionPath::root(collections::WALLETS).doc(user_id.as_str())
    }

    fn ledger(user_id: &UserId) -> CollectionPath {
        Self::path(user_id).subcollection(collections::TRANSACTIONS)
    }

    /// Get the stored wallet, if the user has one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<Wallet>, RepositoryError> {
        let Some(snapshot) = self.store.get(&Self::path(user_id)).await? else {
            return Ok(None);
        };
        let doc: WalletDocument = decode(&snapshot)?;

        Ok(Some(Wallet {
            user_id: user_id.clone(),
            balance: doc.balance,
            updated_at: doc.updated_at,
        }))
    }

    /// Write a new balance, creating the wallet document if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn set_balance(
        &self,
        user_id: &UserId,
        balance: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        let document = WalletDocument {
            balance,
            updated_at: Some(now()),
        };
        self.store
            .set(&Self::path(user_id), to_fields(&document)?)
            .await?;

        Ok(Wallet {
            user_id: user_id.clone(),
            balance,
            updated_at: document.updated_at,
        })
    }

    /// Append a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn add_transaction(
        &self,
        user_id: &UserId,
        description: &str,
        amount: Decimal,
    ) -> Result<Transaction, RepositoryError> {
        let document = TransactionDocument {
            description: description.to_owned(),
            amount,
            timestamp: now(),
        };
        let id = self
            .store
            .add(&Self::ledger(user_id), to_fields(&document)?)
            .await?;

        Ok(Transaction {
            id: TransactionId::new(id),
            description: document.description,
            amount,
            timestamp: document.timestamp,
        })
    }

    /// Most recent ledger entries first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn transactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let query = Query::new(Self::ledger(user_id))
            .order_by("timestamp", Direction::Descending)
            .limit(limit);

        self.store
            .query(&query)
            .await?
            .iter()
            .map(into_transaction)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    #[tokio::test]
    async fn test_missing_wallet() {
        let store = MemoryDocumentStore::new();
        let wallets = WalletRepository::new(&store);
        assert!(wallets.get(&UserId::new("u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_balance_keeps_cents() {
        let store = MemoryDocumentStore::new();
        let wallets = WalletRepository::new(&store);
        let user = UserId::new("u1");

        wallets.set_balance(&user, Decimal::new(1050, 2)).await.unwrap();
        let wallet = wallets.get(&user).await.unwrap().unwrap();

        assert_eq!(wallet.balance, Decimal::new(1050, 2));
        assert!(wallet.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_transactions_newest_first_with_limit() {
        let store = MemoryDocumentStore::new();
        let wallets = WalletRepository::new(&store);
        let user = UserId::new("u1");

        for (i, amount) in [10, -3, 7].into_iter().enumerate() {
            wallets
                .add_transaction(&user, &format!("t{i}"), Decimal::from(amount))
                .await
                .unwrap();
            // Distinct millisecond timestamps
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let recent = wallets.transactions(&user, 2).await.unwrap();
        let descriptions: Vec<&str> = recent.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["t2", "t1"]);
        assert_eq!(recent[1].amount, Decimal::from(-3));
    }
}
