//! Cart route handlers.
//!
//! The cart is server-side state keyed on the customer, so it follows the
//! account across devices. Quantities merge on add; setting a quantity
//! below 1 removes the line.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use warna_moto_core::ProductId;

use crate::db::cart::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartSummary;
use crate::state::AppState;

/// Maximum quantity for one cart line.
const MAX_LINE_QUANTITY: i32 = 99;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// GET /api/cart
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CartSummary>> {
    let items = CartRepository::new(state.pool()).list(customer.id).await?;

    Ok(Json(CartSummary::from_items(items)))
}

/// POST /api/cart
///
/// Add a product to the cart, merging with any existing line.
///
/// # Errors
///
/// Returns 400 for out-of-range quantities.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<AddRequest>,
) -> Result<Json<CartSummary>> {
    let quantity = body.quantity.unwrap_or(1);
    validate_quantity(quantity)?;

    let repo = CartRepository::new(state.pool());
    repo.add(customer.id, body.product_id, quantity).await?;

    let items = repo.list(customer.id).await?;
    Ok(Json(CartSummary::from_items(items)))
}

/// PUT /api/cart
///
/// Set a line's quantity. Zero or negative removes the line.
///
/// # Errors
///
/// Returns 404 if the line doesn't exist, 400 for out-of-range quantities.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<CartSummary>> {
    let repo = CartRepository::new(state.pool());

    if body.quantity < 1 {
        repo.remove(customer.id, body.product_id).await?;
    } else {
        validate_quantity(body.quantity)?;
        repo.set_quantity(customer.id, body.product_id, body.quantity)
            .await?;
    }

    let items = repo.list(customer.id).await?;
    Ok(Json(CartSummary::from_items(items)))
}

/// DELETE /api/cart/{product_id}
///
/// Removing an absent line succeeds; the response is the current cart
/// either way.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartSummary>> {
    let repo = CartRepository::new(state.pool());
    repo.remove(customer.id, product_id).await?;

    let items = repo.list(customer.id).await?;
    Ok(Json(CartSummary::from_items(items)))
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}
