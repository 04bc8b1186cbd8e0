//! Database access for the storefront `PostgreSQL` instance.
//!
//! # Schema: `store`
//!
//! The storefront owns row-level CRUD only; cross-row business rules
//! (nearest-color search, catalog search/sort, the single-primary-address
//! rule, and settlement-time stock finalization) live in stored procedures
//! that the repositories invoke as black boxes:
//!
//! - `search_and_sort_products`
//! - `find_closest_colors`
//! - `get_related_products`
//! - `set_primary_address`
//! - `handle_successful_payment`
//!
//! ## Tables
//!
//! - `customers` / `customer_passwords` - local accounts
//! - `sessions` - tower-sessions storage
//! - `products` - catalog (written out of band)
//! - `cart_items` - per-customer carts, unique on (customer_id, product_id)
//! - `addresses` - address book
//! - `orders` / `order_items` / `payments` - checkout
//! - `vouchers` / `customer_vouchers`
//! - `stock_ledger` / `transaction_ledger` / `bookkeeping_backlog`

pub mod addresses;
pub mod cart;
pub mod customers;
pub mod orders;
pub mod products;
pub mod vouchers;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
