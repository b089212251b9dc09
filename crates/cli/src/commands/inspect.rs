//! Read-only views of a user's account data.

use tracing::info;

use marketplace_core::UserId;
use marketplace_storefront::models::AddressQuery;
use marketplace_storefront::services::{AddressService, WalletService};

use super::CliError;

/// Log a user's saved addresses in display order (default first).
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn addresses(user_id: &str, search: Option<String>) -> Result<(), CliError> {
    let backend = super::connect()?;
    let user_id = UserId::new(user_id.trim());
    let query = AddressQuery { search };

    let addresses = AddressService::new(&backend).list(&user_id, &query).await?;
    info!(user_id = %user_id, count = addresses.len(), "Saved addresses");

    for address in &addresses {
        info!(
            id = %address.id,
            default = address.is_default,
            "{}, {}, {} {}, {}",
            address.full_name,
            address.address_line1,
            address.city,
            address.postal_code,
            address.country,
        );
    }

    Ok(())
}

/// Log a user's wallet balance and most recent ledger entries.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn wallet(user_id: &str, limit: usize) -> Result<(), CliError> {
    let backend = super::connect()?;
    let user_id = UserId::new(user_id.trim());
    let service = WalletService::new(&backend);

    let wallet = service.get_wallet(&user_id).await?;
    info!(user_id = %user_id, balance = %wallet.balance, "Wallet");

    for tx in service.transactions(&user_id, Some(limit)).await? {
        info!(
            id = %tx.id,
            amount = %tx.amount,
            at = %tx.timestamp.to_rfc3339(),
            "{}",
            tx.description
        );
    }

    Ok(())
}
