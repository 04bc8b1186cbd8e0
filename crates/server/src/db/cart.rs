//! Cart repository.
//!
//! Cart lines are unique on (customer_id, product_id); adding an existing
//! product accumulates quantity via an upsert. Every mutation is persisted
//! immediately; the caller re-reads the cart afterwards rather than merging
//! optimistically.

use sqlx::PgPool;

use warna_moto_core::{CustomerId, ProductId};

use super::RepositoryError;
use crate::models::cart::CartItem;

/// Database row for a cart line joined with its product.
#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: ProductId,
    quantity: i32,
    name: String,
    unit_price: warna_moto_core::Rupiah,
    image_url: Option<String>,
    weight_grams: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            name: row.name,
            unit_price: row.unit_price,
            image_url: row.image_url,
            weight_grams: row.weight_grams,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's cart, denormalized with product fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer_id: CustomerId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT ci.product_id, ci.quantity,
                   p.name, p.price AS unit_price, p.image_url, p.weight_grams
            FROM store.cart_items ci
            JOIN store.products p ON p.id = ci.product_id
            WHERE ci.customer_id = $1
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Add quantity to a cart line, inserting it if absent.
    ///
    /// The upsert accumulates: adding 2 then 3 of the same product leaves a
    /// quantity of 5, never 3.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.cart_items (customer_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id)
            DO UPDATE SET quantity = store.cart_items.quantity + EXCLUDED.quantity,
                          updated_at = now()
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the quantity of an existing cart line.
    ///
    /// Callers must route quantities below 1 to [`Self::remove`] instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.cart_items
            SET quantity = $3, updated_at = now()
            WHERE customer_id = $1 AND product_id = $2
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// Removing an absent line is a no-op, matching the soft failure policy
    /// of cart mutations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM store.cart_items
            WHERE customer_id = $1 AND product_id = $2
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Empty the customer's cart. Called after an order is placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, customer_id: CustomerId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM store.cart_items WHERE customer_id = $1")
            .bind(customer_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
