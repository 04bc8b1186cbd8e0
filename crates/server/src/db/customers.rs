//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warna_moto_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::customer::Customer;

/// Database row for a customer.
#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    email: String,
    full_name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> Result<Customer, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Customer {
            id: self.id,
            email,
            full_name: self.full_name,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, email, full_name, phone, created_at, updated_at
            FROM store.customers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    /// Get a customer by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, email, full_name, phone, created_at, updated_at
            FROM store.customers
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    /// Create a new customer with a password, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        full_name: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO store.customers (email, full_name, phone)
            VALUES ($1, $2, $3)
            RETURNING id, email, full_name, phone, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(full_name)
        .bind(phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let customer = row.into_customer()?;

        sqlx::query(
            r"
            INSERT INTO store.customer_passwords (customer_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(customer.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(customer)
    }

    /// Get a customer and their password hash by email.
    ///
    /// Returns `None` if the customer doesn't exist or has no password set
    /// (e.g. an account provisioned through the hosted auth platform).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            customer: CustomerRow,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, Row>(
            r"
            SELECT c.id, c.email, c.full_name, c.phone, c.created_at, c.updated_at,
                   p.password_hash
            FROM store.customers c
            LEFT JOIN store.customer_passwords p ON c.id = p.customer_id
            WHERE c.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((row.customer.into_customer()?, password_hash)))
    }
}
