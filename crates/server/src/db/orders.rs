//! Order, order item, and payment repository.
//!
//! Order + items are inserted in one transaction so a failed item insert
//! never leaves a headless order behind. Settlement finalization (stock
//! deduction, status flip) is the remote `handle_successful_payment`
//! procedure's job; the bookkeeping mirror afterwards is best-effort and
//! failures land in a backlog table for retry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warna_moto_core::{CustomerId, OrderId, OrderStatus, PaymentStatus, Rupiah};

use super::RepositoryError;
use crate::models::order::{NewOrder, NewOrderItem, Order, OrderItem, Payment};

/// Database row for an order.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    status: String,
    subtotal_products: Rupiah,
    shipping_cost: Rupiah,
    service_fee: Rupiah,
    total_amount: Rupiah,
    recipient_name: String,
    recipient_phone: String,
    shipping_address: String,
    destination_text: String,
    postal_code: String,
    courier_code: String,
    courier_service: String,
    shipping_etd: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            status,
            subtotal_products: self.subtotal_products,
            shipping_cost: self.shipping_cost,
            service_fee: self.service_fee,
            total_amount: self.total_amount,
            recipient_name: self.recipient_name,
            recipient_phone: self.recipient_phone,
            shipping_address: self.shipping_address,
            destination_text: self.destination_text,
            postal_code: self.postal_code,
            courier_code: self.courier_code,
            courier_service: self.courier_service,
            shipping_etd: self.shipping_etd,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for an order item.
#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: warna_moto_core::OrderItemId,
    order_id: OrderId,
    product_id: warna_moto_core::ProductId,
    quantity: i32,
    unit_price: Rupiah,
    product_name: String,
    product_sku: Option<String>,
    product_image: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            product_name: row.product_name,
            product_sku: row.product_sku,
            product_image: row.product_image,
        }
    }
}

/// Database row for a payment.
#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: warna_moto_core::PaymentId,
    order_id: OrderId,
    gateway_transaction_id: Option<String>,
    amount: Rupiah,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, RepositoryError> {
        let status = self.status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            gateway_transaction_id: self.gateway_transaction_id,
            amount: self.amount,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, status, subtotal_products, \
     shipping_cost, service_fee, total_amount, recipient_name, recipient_phone, \
     shipping_address, destination_text, postal_code, courier_code, courier_service, \
     shipping_etd, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its items in one transaction.
    ///
    /// The order starts in `awaiting_payment`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_items(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO store.orders \
                 (order_number, customer_id, address_id, status, subtotal_products, \
                  shipping_cost, service_fee, total_amount, recipient_name, recipient_phone, \
                  shipping_address, destination_text, postal_code, courier_code, \
                  courier_service, shipping_etd) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.address_id)
        .bind(OrderStatus::AwaitingPayment.as_str())
        .bind(order.subtotal_products)
        .bind(order.shipping_cost)
        .bind(order.service_fee)
        .bind(order.total_amount)
        .bind(&order.recipient_name)
        .bind(&order.recipient_phone)
        .bind(&order.shipping_address)
        .bind(&order.destination_text)
        .bind(&order.postal_code)
        .bind(&order.courier_code)
        .bind(&order.courier_service)
        .bind(order.shipping_etd.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order number already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let created = row.into_order()?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO store.order_items
                    (order_id, product_id, quantity, unit_price,
                     product_name, product_sku, product_image)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(created.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(&item.product_name)
            .bind(item.product_sku.as_deref())
            .bind(item.product_image.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    /// Get an order by its order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.orders \
             WHERE customer_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Get one of a customer's orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_customer(
        &self,
        order_number: &str,
        customer_id: CustomerId,
    ) -> Result<Option<(Order, Vec<OrderItem>)>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.orders \
             WHERE order_number = $1 AND customer_id = $2"
        ))
        .bind(order_number)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row.into_order()?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price,
                   product_name, product_sku, product_image
            FROM store.order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some((order, items.into_iter().map(OrderItem::from).collect())))
    }

    /// Items for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price,
                   product_name, product_sku, product_image
            FROM store.order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items.into_iter().map(OrderItem::from).collect())
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Finalize a settled order through the remote
    /// `handle_successful_payment` procedure, which deducts stock and flips
    /// the order status atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn finalize_settlement(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("SELECT handle_successful_payment($1)")
            .bind(order_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Create a `pending` payment row for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_payment(
        &self,
        order_id: OrderId,
        gateway_transaction_id: Option<&str>,
        amount: Rupiah,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            INSERT INTO store.payments (order_id, gateway_transaction_id, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, gateway_transaction_id, amount, status,
                      created_at, updated_at
            ",
        )
        .bind(order_id)
        .bind(gateway_transaction_id)
        .bind(amount)
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(self.pool)
        .await?;

        row.into_payment()
    }

    /// Get the payment row for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_payment(&self, order_id: OrderId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, order_id, gateway_transaction_id, amount, status,
                   created_at, updated_at
            FROM store.payments
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    /// Update a payment's status (and transaction id, once known).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment doesn't exist.
    pub async fn update_payment_status(
        &self,
        order_id: OrderId,
        status: PaymentStatus,
        gateway_transaction_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.payments
            SET status = $2,
                gateway_transaction_id = COALESCE($3, gateway_transaction_id),
                updated_at = now()
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .bind(status.as_str())
        .bind(gateway_transaction_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Bookkeeping mirror
    // =========================================================================

    /// Mirror a settled sale into the stock and transaction ledgers.
    ///
    /// Best-effort by contract: the caller treats failures as retryable and
    /// queues them via [`Self::queue_bookkeeping_retry`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn mirror_sale(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO store.stock_ledger (product_id, quantity_delta, reference)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(item.product_id)
            .bind(-item.quantity)
            .bind(&order.order_number)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            INSERT INTO store.transaction_ledger (order_number, entry, amount)
            VALUES ($1, 'sale', $2)
            ",
        )
        .bind(&order.order_number)
        .bind(order.total_amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Queue a failed bookkeeping mirror for later retry instead of
    /// dropping it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn queue_bookkeeping_retry(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.bookkeeping_backlog (order_id, reason)
            VALUES ($1, $2)
            ",
        )
        .bind(order_id)
        .bind(reason)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
