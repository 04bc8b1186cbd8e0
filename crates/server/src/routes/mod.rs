//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the database)
//!
//! # Auth
//! POST /api/auth/register               - Create an account
//! POST /api/auth/login                  - Login
//! POST /api/auth/logout                 - Logout
//! GET  /api/auth/me                     - Current customer
//!
//! # Catalog
//! GET  /api/products                    - Search/sort/paginate the catalog
//! GET  /api/products/{slug}             - Product detail
//! GET  /api/products/{slug}/related     - Related products
//! POST /api/colors/match                - Nearest-color paint search
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Cart contents with totals
//! POST   /api/cart                      - Add a product (merges quantities)
//! PUT    /api/cart                      - Set a line's quantity
//! DELETE /api/cart/{product_id}         - Remove a line
//!
//! # Addresses (requires auth)
//! GET    /api/addresses                 - List addresses
//! POST   /api/addresses                 - Create address
//! PUT    /api/addresses/{id}            - Update address
//! DELETE /api/addresses/{id}            - Delete address
//! POST   /api/addresses/{id}/primary    - Mark as primary
//!
//! # Shipping
//! POST /api/shipping/cost               - Quote courier services (requires auth)
//! GET  /api/shipping/track              - Track a waybill (?awb=&courier=)
//!
//! # Checkout & payment
//! POST /api/payment/create-transaction  - Place order, get Snap token (requires auth)
//! POST /api/payment/webhook             - Gateway notification (no auth, signature-verified)
//!
//! # Vouchers
//! GET  /api/vouchers/public             - Publicly claimable vouchers
//! POST /api/vouchers/claim              - Claim a voucher (requires auth)
//! POST /api/vouchers/apply              - Validate a voucher against the cart (requires auth)
//! GET  /api/vouchers/my-vouchers        - Claimed vouchers (requires auth)
//!
//! # Orders (requires auth)
//! GET  /api/orders                      - Order history
//! GET  /api/orders/{order_number}       - Order detail with items
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod colors;
pub mod orders;
pub mod payment;
pub mod products;
pub mod shipping;
pub mod vouchers;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Assemble the full `/api` router with per-group rate limits.
///
/// Auth endpoints get the strict limiter. The payment webhook is exempt
/// from rate limiting entirely; throttling gateway retries would only
/// delay settlement.
pub fn routes() -> Router<AppState> {
    let limited = Router::new()
        .nest("/products", product_routes())
        .nest("/colors", color_routes())
        .nest("/cart", cart_routes())
        .nest("/addresses", address_routes())
        .nest("/shipping", shipping_routes())
        .nest("/vouchers", voucher_routes())
        .nest("/orders", order_routes())
        .route(
            "/payment/create-transaction",
            post(payment::create_transaction),
        )
        .layer(api_rate_limiter());

    Router::new().nest(
        "/api",
        Router::new()
            .nest("/auth", auth_routes().layer(auth_rate_limiter()))
            .merge(limited)
            .route("/payment/webhook", post(payment::webhook)),
    )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route("/{slug}/related", get(products::related))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).put(cart::update))
        .route("/{product_id}", delete(cart::remove))
}

/// Create the address book routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::destroy),
        )
        .route("/{id}/primary", post(addresses::set_primary))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/cost", post(shipping::cost))
        .route("/track", get(shipping::track))
}

/// Create the voucher routes router.
pub fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/public", get(vouchers::public))
        .route("/claim", post(vouchers::claim))
        .route("/apply", post(vouchers::apply))
        .route("/my-vouchers", get(vouchers::my_vouchers))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{order_number}", get(orders::show))
}

/// Create the color-matching routes router.
pub fn color_routes() -> Router<AppState> {
    Router::new().route("/match", post(colors::match_colors))
}
