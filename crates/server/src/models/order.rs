//! Order, order item, and payment domain types.
//!
//! Orders snapshot the address, courier, and product details at creation
//! time; later edits to the address book or catalog never retroactively
//! change a placed order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use warna_moto_core::{
    AddressId, CustomerId, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentStatus, ProductId,
    Rupiah,
};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable `PREFIX-YYYYMMDD-XXXXX` identifier; this is also the
    /// order id the payment gateway sees.
    pub order_number: String,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub subtotal_products: Rupiah,
    pub shipping_cost: Rupiah,
    pub service_fee: Rupiah,
    pub total_amount: Rupiah,
    /// Snapshot of the shipping address at creation time.
    pub recipient_name: String,
    pub recipient_phone: String,
    pub shipping_address: String,
    pub destination_text: String,
    pub postal_code: String,
    /// Snapshot of the selected courier service.
    pub courier_code: String,
    pub courier_service: String,
    pub shipping_etd: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on a placed order. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price at time of purchase.
    pub unit_price: Rupiah,
    /// Product snapshot at time of purchase.
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
}

/// A payment record tied to a gateway transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub gateway_transaction_id: Option<String>,
    pub amount: Rupiah,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: CustomerId,
    pub address_id: AddressId,
    pub subtotal_products: Rupiah,
    pub shipping_cost: Rupiah,
    pub service_fee: Rupiah,
    pub total_amount: Rupiah,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub shipping_address: String,
    pub destination_text: String,
    pub postal_code: String,
    pub courier_code: String,
    pub courier_service: String,
    pub shipping_etd: Option<String>,
}

/// Fields for inserting a new order item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Rupiah,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_image: Option<String>,
}
