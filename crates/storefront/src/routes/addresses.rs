//! Address book route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use marketplace_core::AddressId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, AddressQuery};
use crate::services::AddressService;
use crate::state::AppState;

/// The user's addresses, default first.
///
/// GET /api/account/addresses?search=
///
/// # Errors
///
/// Returns `AppError::Address` if the list cannot be read.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressService::new(state.backend())
        .list(&user.id, &query)
        .await?;
    Ok(Json(addresses))
}

/// One address.
///
/// GET /api/account/addresses/{id}
///
/// # Errors
///
/// Returns `404` if the address does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressService::new(state.backend())
        .get(&user.id, &id)
        .await?;
    Ok(Json(address))
}

/// Save a new address.
///
/// POST /api/account/addresses
///
/// # Errors
///
/// Returns `400` for missing fields or out-of-range coordinates.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = AddressService::new(state.backend())
        .add(&user.id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Replace an address.
///
/// PUT /api/account/addresses/{id}
///
/// # Errors
///
/// Returns `400` for invalid input and `404` if the address does not exist.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    let address = AddressService::new(state.backend())
        .update(&user.id, &id, input)
        .await?;
    Ok(Json(address))
}

/// Delete an address.
///
/// DELETE /api/account/addresses/{id}
///
/// # Errors
///
/// Returns `404` if the address does not exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressService::new(state.backend())
        .delete(&user.id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the default.
///
/// POST /api/account/addresses/{id}/default
///
/// # Errors
///
/// Returns `404` if the address does not exist.
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressService::new(state.backend())
        .set_default(&user.id, &id)
        .await?;
    Ok(Json(address))
}
