//! Voucher route handlers.
//!
//! Claiming binds a voucher to a customer; applying validates it against
//! the current cart and returns the discount without consuming the claim.
//! The claim is only marked used at settlement, by the remote procedure.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use warna_moto_core::Rupiah;

use crate::db::cart::CartRepository;
use crate::db::vouchers::VoucherRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartSummary;
use crate::models::voucher::{Voucher, VoucherClaim};
use crate::state::AppState;

/// Claim/apply request body.
#[derive(Debug, Deserialize)]
pub struct VoucherCodeRequest {
    pub code: String,
}

/// Discount computed for the customer's current cart.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub voucher: Voucher,
    pub subtotal: Rupiah,
    pub discount: Rupiah,
    pub subtotal_after_discount: Rupiah,
}

/// A claimed voucher with its claim state.
#[derive(Debug, Serialize)]
pub struct ClaimedVoucher {
    pub voucher: Voucher,
    pub claimed_at: chrono::DateTime<Utc>,
    pub used_at: Option<chrono::DateTime<Utc>>,
}

/// GET /api/vouchers/public
///
/// Active, unexpired vouchers anyone may claim.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn public(State(state): State<AppState>) -> Result<Json<Vec<Voucher>>> {
    let vouchers = VoucherRepository::new(state.pool()).list_public().await?;

    Ok(Json(vouchers))
}

/// POST /api/vouchers/claim
///
/// # Errors
///
/// Returns 404 for an unknown code, 409 if already claimed.
pub async fn claim(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<VoucherCodeRequest>,
) -> Result<Json<ClaimedVoucher>> {
    let repo = VoucherRepository::new(state.pool());

    let voucher = find_voucher(&repo, &body.code).await?;
    let claim = repo.claim(voucher.id, customer.id).await?;

    Ok(Json(ClaimedVoucher {
        voucher,
        claimed_at: claim.claimed_at,
        used_at: claim.used_at,
    }))
}

/// POST /api/vouchers/apply
///
/// Validate a claimed voucher against the current cart and compute the
/// discount.
///
/// # Errors
///
/// Returns 404 for an unknown or unclaimed code, 400 when the voucher is
/// inactive, expired, used, or the cart is below its minimum.
pub async fn apply(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<VoucherCodeRequest>,
) -> Result<Json<ApplyResponse>> {
    let repo = VoucherRepository::new(state.pool());

    let voucher = find_voucher(&repo, &body.code).await?;
    let claim: VoucherClaim = repo
        .get_claim(voucher.id, customer.id)
        .await?
        .ok_or_else(|| AppError::BadRequest("voucher has not been claimed".to_owned()))?;

    let cart = CartSummary::from_items(CartRepository::new(state.pool()).list(customer.id).await?);
    if cart.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let discount = voucher.apply(&claim, cart.subtotal, Utc::now())?;

    Ok(Json(ApplyResponse {
        subtotal: cart.subtotal,
        discount,
        subtotal_after_discount: cart.subtotal - discount,
        voucher,
    }))
}

/// GET /api/vouchers/my-vouchers
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn my_vouchers(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<ClaimedVoucher>>> {
    let claimed = VoucherRepository::new(state.pool())
        .list_claimed(customer.id)
        .await?;

    Ok(Json(
        claimed
            .into_iter()
            .map(|(voucher, claim)| ClaimedVoucher {
                voucher,
                claimed_at: claim.claimed_at,
                used_at: claim.used_at,
            })
            .collect(),
    ))
}

async fn find_voucher(repo: &VoucherRepository<'_>, code: &str) -> Result<Voucher> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".to_owned()));
    }

    repo.find_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("voucher {code}")))
}
