//! Address book route handlers.
//!
//! Every operation is scoped to the logged-in customer; an address id that
//! belongs to someone else behaves exactly like one that doesn't exist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;

use warna_moto_core::AddressId;

use crate::db::addresses::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::address::{Address, AddressInput};
use crate::state::AppState;

/// GET /api/addresses
///
/// List the customer's addresses, primary first.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list(customer.id)
        .await?;

    Ok(Json(addresses))
}

/// POST /api/addresses
///
/// # Errors
///
/// Returns 400 when a required field is blank.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    validate_input(&input)?;

    let address = AddressRepository::new(state.pool())
        .create(customer.id, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/addresses/{id}
///
/// # Errors
///
/// Returns 404 if the address isn't the customer's, 400 for blank fields.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    validate_input(&input)?;

    let address = AddressRepository::new(state.pool())
        .update(id, customer.id, &input)
        .await?;

    Ok(Json(address))
}

/// DELETE /api/addresses/{id}
///
/// # Errors
///
/// Returns 404 if the address isn't the customer's.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<serde_json::Value>> {
    let deleted = AddressRepository::new(state.pool())
        .delete(id, customer.id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("address {id}")));
    }

    Ok(Json(json!({ "message": "Address deleted" })))
}

/// POST /api/addresses/{id}/primary
///
/// Mark an address as primary; the procedure clears the flag on the
/// customer's other addresses in the same statement.
///
/// # Errors
///
/// Returns 404 if the address isn't the customer's.
pub async fn set_primary(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let repo = AddressRepository::new(state.pool());

    // Ownership check before invoking the procedure
    repo.get_owned(id, customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    repo.set_primary(id, customer.id).await?;

    let address = repo
        .get_owned(id, customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    Ok(Json(address))
}

fn validate_input(input: &AddressInput) -> Result<()> {
    if let Some(field) = input.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}
