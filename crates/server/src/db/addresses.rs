//! Address book repository.
//!
//! All reads and writes are scoped to the owning customer. The
//! single-primary invariant is enforced by the remote `set_primary_address`
//! procedure.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warna_moto_core::{AddressId, CustomerId};

use super::RepositoryError;
use crate::models::address::{Address, AddressInput};

/// Database row for an address.
#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    customer_id: CustomerId,
    label: String,
    recipient_name: String,
    recipient_phone: String,
    full_address: String,
    destination_city: String,
    destination_text: String,
    postal_code: String,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            label: row.label,
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            full_address: row.full_address,
            destination_city: row.destination_city,
            destination_text: row.destination_text,
            postal_code: row.postal_code,
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, customer_id, label, recipient_name, recipient_phone, \
     full_address, destination_city, destination_text, postal_code, is_primary, \
     created_at, updated_at";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's addresses, primary first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer_id: CustomerId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM store.addresses \
             WHERE customer_id = $1 \
             ORDER BY is_primary DESC, created_at ASC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get an address if it belongs to the given customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: AddressId,
        customer_id: CustomerId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM store.addresses \
             WHERE id = $1 AND customer_id = $2"
        ))
        .bind(id)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create an address for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO store.addresses \
                 (customer_id, label, recipient_name, recipient_phone, full_address, \
                  destination_city, destination_text, postal_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(customer_id)
        .bind(&input.label)
        .bind(&input.recipient_name)
        .bind(&input.recipient_phone)
        .bind(&input.full_address)
        .bind(&input.destination_city)
        .bind(&input.destination_text)
        .bind(&input.postal_code)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an address owned by a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another customer.
    pub async fn update(
        &self,
        id: AddressId,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE store.addresses \
             SET label = $3, recipient_name = $4, recipient_phone = $5, full_address = $6, \
                 destination_city = $7, destination_text = $8, postal_code = $9, \
                 updated_at = now() \
             WHERE id = $1 AND customer_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(customer_id)
        .bind(&input.label)
        .bind(&input.recipient_name)
        .bind(&input.recipient_phone)
        .bind(&input.full_address)
        .bind(&input.destination_city)
        .bind(&input.destination_text)
        .bind(&input.postal_code)
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an address owned by a customer.
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        id: AddressId,
        customer_id: CustomerId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM store.addresses
            WHERE id = $1 AND customer_id = $2
            ",
        )
        .bind(id)
        .bind(customer_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an address as the customer's primary via the remote
    /// `set_primary_address` procedure, which clears the flag on siblings
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn set_primary(
        &self,
        id: AddressId,
        customer_id: CustomerId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("SELECT set_primary_address($1, $2)")
            .bind(customer_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
