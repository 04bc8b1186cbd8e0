//! Warna Moto Core - Shared domain types.
//!
//! This crate provides the common types used by the Warna Moto storefront
//! server: type-safe entity IDs, rupiah money arithmetic, email validation,
//! and the order/payment status state machines.
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database
//! access, no HTTP clients. Database trait impls (sqlx `Type`/`Encode`/
//! `Decode`) are gated behind the `postgres` feature so the crate stays
//! lightweight for pure-logic consumers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
