//! Customer domain types.
//!
//! A customer is the storefront's own record of an end user, distinct from
//! any auth-provider identity it may be linked to.

use chrono::{DateTime, Utc};
use serde::Serialize;

use warna_moto_core::{CustomerId, Email};

/// A storefront customer (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Customer's display name.
    pub full_name: String,
    /// Contact phone number, if provided.
    pub phone: Option<String>,
    /// When the customer registered.
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}
