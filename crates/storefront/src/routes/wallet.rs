//! Wallet route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Receipt, Transaction, Wallet};
use crate::services::WalletService;
use crate::state::AppState;

/// Ledger page size.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

/// Deposit or payment request.
#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Current balance.
///
/// GET /api/account/wallet
///
/// # Errors
///
/// Returns `AppError::Wallet` if the wallet cannot be read.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Wallet>> {
    let wallet = WalletService::new(state.backend())
        .get_wallet(&user.id)
        .await?;
    Ok(Json(wallet))
}

/// Recent ledger entries.
///
/// GET /api/account/wallet/transactions?limit=
///
/// # Errors
///
/// Returns `AppError::Wallet` if the ledger cannot be read.
pub async fn transactions(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<Transaction>>> {
    let transactions = WalletService::new(state.backend())
        .transactions(&user.id, query.limit)
        .await?;
    Ok(Json(transactions))
}

/// Credit the wallet.
///
/// POST /api/account/wallet/deposit
///
/// # Errors
///
/// Returns `400` for a non-positive, sub-cent or oversized amount and `422`
/// when the balance would pass its limit.
pub async fn deposit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<MovementRequest>,
) -> Result<Json<Receipt>> {
    let receipt = WalletService::new(state.backend())
        .deposit(&user.id, request.amount, &request.description)
        .await?;
    let amount = request.amount.to_string();
    add_breadcrumb("wallet", "Deposit", Some(&[("amount", amount.as_str())]));
    Ok(Json(receipt))
}

/// Pay from the wallet.
///
/// POST /api/account/wallet/pay
///
/// # Errors
///
/// Returns `400` for a non-positive, sub-cent or oversized amount and `402`
/// when the balance is too low.
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<MovementRequest>,
) -> Result<Json<Receipt>> {
    let receipt = WalletService::new(state.backend())
        .pay(&user.id, request.amount, &request.description)
        .await?;
    let amount = request.amount.to_string();
    add_breadcrumb("wallet", "Payment", Some(&[("amount", amount.as_str())]));
    Ok(Json(receipt))
}
