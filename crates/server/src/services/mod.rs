//! External service integrations.

pub mod auth;
pub mod midtrans;
pub mod rajaongkir;

pub use midtrans::{MidtransClient, MidtransError};
pub use rajaongkir::{RajaOngkirClient, RajaOngkirError};
