//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types and from the JSON request/response shapes in `routes/`.

pub mod address;
pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;
pub mod voucher;

pub use session::{CurrentCustomer, session_keys};
