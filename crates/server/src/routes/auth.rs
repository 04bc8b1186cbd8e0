//! Authentication route handlers.
//!
//! JSON endpoints for registration, login, logout, and the current-customer
//! lookup. Successful login rotates the session id before storing the
//! customer.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::models::customer::Customer;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Customer payload returned by auth endpoints.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub customer: Customer,
}

/// POST /api/auth/register
///
/// Create an account and log the new customer in.
///
/// # Errors
///
/// Returns 400 for invalid email/weak password, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>)> {
    if body.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name is required".to_owned()));
    }

    let auth = AuthService::new(state.pool());
    let customer = auth
        .register(
            &body.email,
            &body.password,
            body.full_name.trim(),
            body.phone.as_deref(),
        )
        .await?;

    establish_session(&session, &customer).await?;

    Ok((StatusCode::CREATED, Json(CustomerResponse { customer })))
}

/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for bad credentials.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CustomerResponse>> {
    let auth = AuthService::new(state.pool());
    let customer = auth.login(&body.email, &body.password).await?;

    establish_session(&session, &customer).await?;

    Ok(Json(CustomerResponse { customer }))
}

/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_customer(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    clear_sentry_user();

    Ok(Json(json!({ "message": "Logged out" })))
}

/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 when not logged in, 404 if the account has been deleted.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<CustomerResponse>> {
    let auth = AuthService::new(state.pool());
    let customer = auth.get_customer(current.id).await?;

    Ok(Json(CustomerResponse { customer }))
}

/// Rotate the session id and store the logged-in customer.
async fn establish_session(session: &Session, customer: &Customer) -> Result<()> {
    // Cycle the id to prevent session fixation
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let current = CurrentCustomer {
        id: customer.id,
        email: customer.email.clone(),
    };
    set_current_customer(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    Ok(())
}
