//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::{Order, OrderItem};
use crate::state::AppState;

/// An order with its line items.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// GET /api/orders
///
/// The customer's order history, newest first.
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;

    Ok(Json(orders))
}

/// GET /api/orders/{order_number}
///
/// One of the customer's orders with its items. Another customer's order
/// number 404s rather than revealing it exists.
///
/// # Errors
///
/// Returns 404 if the order isn't the customer's.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<OrderDetail>> {
    let (order, items) = OrderRepository::new(state.pool())
        .get_for_customer(&order_number, customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_number}")))?;

    Ok(Json(OrderDetail { order, items }))
}
