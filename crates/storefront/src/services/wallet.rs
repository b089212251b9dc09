//! Wallet service.
//!
//! The balance lives on `wallets/{uid}`; every movement is also appended to
//! the wallet's ledger. The two writes are sequential, so a failure between
//! them leaves the balance updated without a ledger entry.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use marketplace_core::UserId;

use crate::backend::Backend;
use crate::db::{RepositoryError, WalletRepository};
use crate::models::{Receipt, Transaction, Wallet};

/// Ledger page size when none is requested.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 20;

/// Largest ledger page served.
pub const MAX_TRANSACTION_LIMIT: usize = 100;

/// Largest single deposit or payment.
pub const MAX_MOVEMENT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest balance a wallet may hold. Balances are stored as doubles, which
/// stay exact at cent precision well beyond this.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Cents.
const AMOUNT_SCALE: u32 = 2;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("amount may have at most two decimal places")]
    TooPrecise,

    #[error("amount exceeds the limit of {max} per movement")]
    AmountTooLarge { max: Decimal },

    #[error("balance would exceed the limit of {max}")]
    BalanceLimit { max: Decimal },

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Wallet service.
pub struct WalletService<'a> {
    wallets: WalletRepository<'a>,
}

impl<'a> WalletService<'a> {
    /// Create a new wallet service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            wallets: WalletRepository::new(backend.documents.as_ref()),
        }
    }

    /// The user's wallet; a zero balance if they never deposited.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Repository` if the read fails.
    #[instrument(skip(self))]
    pub async fn get_wallet(&self, user_id: &UserId) -> Result<Wallet, WalletError> {
        Ok(self
            .wallets
            .get(user_id)
            .await?
            .unwrap_or_else(|| Wallet::empty(user_id.clone())))
    }

    /// Recent ledger entries, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_TRANSACTION_LIMIT`] and is capped at
    /// [`MAX_TRANSACTION_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let limit = limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT);
        Ok(self.wallets.transactions(user_id, limit).await?)
    }

    /// Credit the wallet.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::InvalidAmount`, `WalletError::TooPrecise` or
    /// `WalletError::AmountTooLarge` for an unusable amount, and
    /// `WalletError::BalanceLimit` if the credit would take the balance past
    /// [`MAX_BALANCE`].
    #[instrument(skip(self, description))]
    pub async fn deposit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, WalletError> {
        validate_amount(amount)?;

        let current = self.get_wallet(user_id).await?;
        let balance = current
            .balance
            .checked_add(amount)
            .filter(|balance| *balance <= MAX_BALANCE)
            .ok_or(WalletError::BalanceLimit { max: MAX_BALANCE })?;
        let receipt = self
            .record(user_id, balance, amount, description, "Deposit")
            .await?;

        info!(%user_id, %amount, balance = %receipt.wallet.balance, "Wallet credited");
        Ok(receipt)
    }

    /// Debit the wallet. The balance never goes below zero.
    ///
    /// # Errors
    ///
    /// Returns the same amount errors as [`Self::deposit`], and
    /// `WalletError::InsufficientFunds` if the amount exceeds the balance.
    #[instrument(skip(self, description))]
    pub async fn pay(
        &self,
        user_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt, WalletError> {
        validate_amount(amount)?;

        let current = self.get_wallet(user_id).await?;
        let declined = || WalletError::InsufficientFunds {
            balance: current.balance,
            requested: amount,
        };
        if amount > current.balance {
            warn!(%user_id, %amount, balance = %current.balance, "Payment declined");
            return Err(declined());
        }
        let balance = current.balance.checked_sub(amount).ok_or_else(declined)?;

        let receipt = self
            .record(user_id, balance, -amount, description, "Payment")
            .await?;

        info!(%user_id, %amount, balance = %receipt.wallet.balance, "Wallet debited");
        Ok(receipt)
    }

    async fn record(
        &self,
        user_id: &UserId,
        balance: Decimal,
        amount: Decimal,
        description: &str,
        fallback: &str,
    ) -> Result<Receipt, WalletError> {
        let description = match description.trim() {
            "" => fallback,
            text => text,
        };

        let wallet = self.wallets.set_balance(user_id, balance).await?;
        let transaction = self
            .wallets
            .add_transaction(user_id, description, amount)
            .await?;

        Ok(Receipt {
            wallet,
            transaction,
        })
    }
}

/// A movement must be positive, in whole cents and within [`MAX_MOVEMENT`].
fn validate_amount(amount: Decimal) -> Result<(), WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount);
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(WalletError::TooPrecise);
    }
    if amount > MAX_MOVEMENT {
        return Err(WalletError::AmountTooLarge { max: MAX_MOVEMENT });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dollars(units: i64) -> Decimal {
        Decimal::new(units * 100, 2)
    }

    #[tokio::test]
    async fn test_new_wallet_is_empty() {
        let backend = Backend::in_memory();
        let wallet = WalletService::new(&backend)
            .get_wallet(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_deposit_then_pay() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");

        service.deposit(&user, dollars(50), "Top up").await.unwrap();
        let receipt = service.pay(&user, Decimal::new(1999, 2), "").await.unwrap();

        assert_eq!(receipt.wallet.balance, Decimal::new(3001, 2));
        assert_eq!(receipt.transaction.amount, Decimal::new(-1999, 2));
        assert_eq!(receipt.transaction.description, "Payment");

        let ledger = service.transactions(&user, None).await.unwrap();
        assert_eq!(ledger.len(), 2);
        let total: Decimal = ledger.iter().map(|t| t.amount).sum();
        assert_eq!(total, service.get_wallet(&user).await.unwrap().balance);
    }

    #[tokio::test]
    async fn test_pay_more_than_balance_is_rejected() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");

        service.deposit(&user, dollars(10), "Top up").await.unwrap();
        let err = service.pay(&user, dollars(11), "Too much").await.unwrap_err();

        assert!(matches!(
            err,
            WalletError::InsufficientFunds { balance, requested }
                if balance == dollars(10) && requested == dollars(11)
        ));
        assert_eq!(service.get_wallet(&user).await.unwrap().balance, dollars(10));
        assert_eq!(service.transactions(&user, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");

        assert!(matches!(
            service.deposit(&user, Decimal::ZERO, "").await,
            Err(WalletError::InvalidAmount)
        ));
        assert!(matches!(
            service.pay(&user, dollars(-5), "").await,
            Err(WalletError::InvalidAmount)
        ));
    }

    #[tokio::test]
    async fn test_huge_amounts_rejected_and_wallet_stays_readable() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");

        for amount in [Decimal::MAX, Decimal::MAX / Decimal::TWO, MAX_MOVEMENT + Decimal::ONE] {
            assert!(matches!(
                service.deposit(&user, amount, "").await,
                Err(WalletError::AmountTooLarge { .. })
            ));
        }
        assert!(matches!(
            service.pay(&user, Decimal::MAX, "").await,
            Err(WalletError::AmountTooLarge { .. })
        ));

        service.deposit(&user, MAX_MOVEMENT, "").await.unwrap();
        assert_eq!(service.get_wallet(&user).await.unwrap().balance, MAX_MOVEMENT);
    }

    #[tokio::test]
    async fn test_sub_cent_amounts_rejected() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");

        assert!(matches!(
            service.deposit(&user, Decimal::new(1_005, 3), "").await,
            Err(WalletError::TooPrecise)
        ));
        // Trailing zeros are fine
        service.deposit(&user, Decimal::new(1_500, 3), "").await.unwrap();
        assert!(matches!(
            service.pay(&user, Decimal::new(1, 3), "").await,
            Err(WalletError::TooPrecise)
        ));
        assert_eq!(
            service.get_wallet(&user).await.unwrap().balance,
            Decimal::new(150, 2)
        );
    }

    #[tokio::test]
    async fn test_deposit_past_balance_limit_is_rejected() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");
        let near_limit = MAX_BALANCE - Decimal::ONE;
        WalletRepository::new(backend.documents.as_ref())
            .set_balance(&user, near_limit)
            .await
            .unwrap();

        let err = service.deposit(&user, dollars(2), "").await.unwrap_err();
        assert!(matches!(err, WalletError::BalanceLimit { max } if max == MAX_BALANCE));
        assert_eq!(service.get_wallet(&user).await.unwrap().balance, near_limit);

        service.deposit(&user, Decimal::ONE, "").await.unwrap();
        assert_eq!(service.get_wallet(&user).await.unwrap().balance, MAX_BALANCE);
    }

    #[tokio::test]
    async fn test_transaction_limit_is_clamped() {
        let backend = Backend::in_memory();
        let service = WalletService::new(&backend);
        let user = UserId::new("u1");
        for _ in 0..3 {
            service.deposit(&user, dollars(1), "Top up").await.unwrap();
        }

        assert_eq!(service.transactions(&user, Some(0)).await.unwrap().len(), 1);
        assert_eq!(service.transactions(&user, Some(2)).await.unwrap().len(), 2);
    }
}
