//! Checkout and payment gateway route handlers.
//!
//! Order creation re-prices every cart line against the catalog and
//! re-quotes shipping server-side; nothing money-related is trusted from
//! the client beyond the chosen address and courier service.
//!
//! The webhook acknowledges every notification with 200 once the body
//! parses, including ones it rejects or ignores, so the gateway doesn't
//! retry notifications we have deliberately declined to act on.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use warna_moto_core::{AddressId, OrderStatus, PaymentStatus};

use crate::checkout::{CheckoutTotals, PricedLine, WebhookAction, generate_order_number};
use crate::db::RepositoryError;
use crate::db::cart::CartRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartSummary;
use crate::models::order::{NewOrder, NewOrderItem, Order};
use crate::services::midtrans::{ChargeItem, ChargeRequest, MidtransNotification};
use crate::state::AppState;

/// How many times to retry an order-number collision before giving up.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Checkout request body.
///
/// The fields are optional so that a missing one surfaces as a 400 with a
/// field-naming message rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub address_id: Option<AddressId>,
    /// Courier code (`jne`, `tiki`, `pos`).
    pub courier: Option<String>,
    /// Service code within the courier (`REG`, `YES`, ...).
    pub courier_service: Option<String>,
}

/// Checkout response payload.
#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub order: Order,
    pub snap_token: String,
    pub redirect_url: String,
}

/// POST /api/payment/create-transaction
///
/// Place an order from the customer's cart and open a gateway transaction
/// for it.
///
/// # Errors
///
/// Returns 400 for a missing field, empty cart, or unknown courier service,
/// 404 for an address that isn't the customer's, 502 when the gateway or
/// shipping aggregator is unavailable.
pub async fn create_transaction(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreateTransactionResponse>)> {
    let address_id = body
        .address_id
        .ok_or_else(|| AppError::BadRequest("address_id is required".to_owned()))?;
    let courier = required_field(body.courier.as_deref(), "courier")?;
    let courier_service = required_field(body.courier_service.as_deref(), "courier_service")?;

    let cart_repo = CartRepository::new(state.pool());

    let cart = CartSummary::from_items(cart_repo.list(customer.id).await?);
    if cart.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let address = crate::db::addresses::AddressRepository::new(state.pool())
        .get_owned(address_id, customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {address_id}")))?;

    // Re-quote shipping; the selected service must still exist on the route
    let services = state
        .rajaongkir()
        .cost(&address.destination_city, cart.total_weight_grams, courier)
        .await?;
    let service = services
        .iter()
        .find(|s| s.service.eq_ignore_ascii_case(courier_service))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "courier service {courier_service} is not available for this route"
            ))
        })?;

    // Re-price every line against the catalog
    let product_ids: Vec<_> = cart.items.iter().map(|i| i.product_id).collect();
    let pricing = ProductRepository::new(state.pool())
        .pricing_for(&product_ids)
        .await?;

    let mut lines = Vec::with_capacity(cart.items.len());
    let mut new_items = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let priced = pricing.get(&item.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("product {} is no longer available", item.product_id))
        })?;

        lines.push(PricedLine {
            unit_price: priced.price,
            quantity: i64::from(item.quantity),
        });
        new_items.push(NewOrderItem {
            product_id: priced.id,
            quantity: item.quantity,
            unit_price: priced.price,
            product_name: priced.name.clone(),
            product_sku: priced.sku.clone(),
            product_image: priced.image_url.clone(),
        });
    }

    let totals = CheckoutTotals::compute(
        &lines,
        service.cost,
        state.config().checkout.service_fee,
    );

    let order_repo = OrderRepository::new(state.pool());
    let order = create_order_with_fresh_number(
        &order_repo,
        &state,
        &customer,
        &address,
        courier,
        service,
        totals,
        &new_items,
    )
    .await?;

    // Open the gateway transaction
    let charge = ChargeRequest {
        order_number: order.order_number.clone(),
        gross_amount: totals.total,
        items: charge_items(&new_items, &totals),
        customer_name: address.recipient_name.clone(),
        customer_email: customer.email.to_string(),
        customer_phone: Some(address.recipient_phone.clone()),
    };
    let snap = state.midtrans().create_snap_token(&charge).await?;

    order_repo
        .create_payment(order.id, None, totals.total)
        .await?;

    cart_repo.clear(customer.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            order,
            snap_token: snap.token,
            redirect_url: snap.redirect_url,
        }),
    ))
}

fn required_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

/// Insert the order, regenerating the random number suffix on collision.
#[allow(clippy::too_many_arguments)]
async fn create_order_with_fresh_number(
    order_repo: &OrderRepository<'_>,
    state: &AppState,
    customer: &crate::models::CurrentCustomer,
    address: &crate::models::address::Address,
    courier: &str,
    service: &crate::services::rajaongkir::ShippingService,
    totals: CheckoutTotals,
    items: &[NewOrderItem],
) -> Result<Order> {
    let today = Utc::now().date_naive();

    for attempt in 0..ORDER_NUMBER_ATTEMPTS {
        let order_number = generate_order_number(
            &state.config().checkout.order_prefix,
            today,
            &mut rand::rng(),
        );

        let new_order = NewOrder {
            order_number,
            customer_id: customer.id,
            address_id: address.id,
            subtotal_products: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            service_fee: totals.service_fee,
            total_amount: totals.total,
            recipient_name: address.recipient_name.clone(),
            recipient_phone: address.recipient_phone.clone(),
            shipping_address: address.full_address.clone(),
            destination_text: address.destination_text.clone(),
            postal_code: address.postal_code.clone(),
            courier_code: courier.to_lowercase(),
            courier_service: service.service.clone(),
            shipping_etd: Some(service.etd.clone()),
        };

        match order_repo.create_with_items(&new_order, items).await {
            Ok(order) => return Ok(order),
            Err(RepositoryError::Conflict(_)) if attempt + 1 < ORDER_NUMBER_ATTEMPTS => {
                tracing::warn!(attempt, "order number collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(
        "could not allocate a unique order number".to_owned(),
    ))
}

/// Build the gateway line items: one per product plus synthetic shipping
/// and service-fee lines, so they sum exactly to the gross amount.
fn charge_items(items: &[NewOrderItem], totals: &CheckoutTotals) -> Vec<ChargeItem> {
    let mut out: Vec<ChargeItem> = items
        .iter()
        .map(|item| ChargeItem {
            id: item.product_id.to_string(),
            price: item.unit_price.to_gateway_units(),
            quantity: i64::from(item.quantity),
            name: item.product_name.clone(),
        })
        .collect();

    out.push(ChargeItem {
        id: "SHIPPING".to_owned(),
        price: totals.shipping_cost.to_gateway_units(),
        quantity: 1,
        name: "Ongkos kirim".to_owned(),
    });
    out.push(ChargeItem {
        id: "SERVICE-FEE".to_owned(),
        price: totals.service_fee.to_gateway_units(),
        quantity: 1,
        name: "Biaya layanan".to_owned(),
    });

    out
}

/// POST /api/payment/webhook
///
/// Gateway payment notification. Unauthenticated; trust comes from the
/// SHA-512 signature over (`order_id`, `status_code`, `gross_amount`) with
/// our server key.
///
/// Responds 200 to everything that parses, even notifications that fail
/// verification or reference unknown orders, so the gateway stops
/// retrying them. State changes only happen for verified notifications.
pub async fn webhook(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<serde_json::Value>) {
    let Ok(notification) = serde_json::from_str::<MidtransNotification>(&body) else {
        tracing::warn!("webhook body failed to parse");
        return acknowledge("ignored: unparseable notification");
    };

    if !state.midtrans().verify_signature(&notification) {
        tracing::warn!(order_id = %notification.order_id, "webhook signature mismatch");
        return acknowledge("ignored: bad signature");
    }

    match process_notification(&state, &notification).await {
        Ok(message) => acknowledge(message),
        Err(e) => {
            // The gateway will retry on non-2xx, and retrying won't fix a
            // database failure faster than we can. Capture and acknowledge.
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                order_id = %notification.order_id,
                error = %e,
                sentry_event_id = %event_id,
                "webhook processing failed"
            );
            acknowledge("accepted: processing deferred")
        }
    }
}

fn acknowledge(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "message": message })))
}

/// Apply a verified notification to the order and payment rows.
async fn process_notification(
    state: &AppState,
    notification: &MidtransNotification,
) -> Result<&'static str> {
    let repo = OrderRepository::new(state.pool());

    let Some(order) = repo.get_by_order_number(&notification.order_id).await? else {
        tracing::warn!(order_id = %notification.order_id, "webhook for unknown order");
        return Ok("ignored: unknown order");
    };

    // Idempotency: a payment already in a terminal state never moves again
    if let Some(payment) = repo.get_payment(order.id).await?
        && payment.status.is_terminal()
    {
        return Ok("ignored: already processed");
    }

    let action = WebhookAction::from_notification(
        &notification.transaction_status,
        notification.fraud_status.as_deref(),
    );
    let transaction_id = notification.transaction_id.as_deref();

    match action {
        WebhookAction::Settle => {
            repo.update_payment_status(order.id, PaymentStatus::Settlement, transaction_id)
                .await?;
            repo.finalize_settlement(order.id).await?;

            mirror_sale_best_effort(&repo, &order).await;

            tracing::info!(order_number = %order.order_number, "order settled");
            Ok("ok: settled")
        }
        WebhookAction::Cancel(payment_status) => {
            repo.update_payment_status(order.id, payment_status, transaction_id)
                .await?;
            repo.update_status(order.id, OrderStatus::Cancelled).await?;

            tracing::info!(
                order_number = %order.order_number,
                status = %payment_status,
                "order cancelled"
            );
            Ok("ok: cancelled")
        }
        WebhookAction::Ignore => Ok("ignored: no action for status"),
    }
}

/// Mirror the settled sale into the bookkeeping ledgers; on failure, queue
/// a retry instead of failing the webhook.
async fn mirror_sale_best_effort(repo: &OrderRepository<'_>, order: &Order) {
    let result = match repo.items(order.id).await {
        Ok(items) => repo.mirror_sale(order, &items).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::warn!(
            order_number = %order.order_number,
            error = %e,
            "bookkeeping mirror failed, queueing retry"
        );
        if let Err(queue_err) = repo.queue_bookkeeping_retry(order.id, &e.to_string()).await {
            sentry::capture_error(&queue_err);
            tracing::error!(
                order_number = %order.order_number,
                error = %queue_err,
                "failed to queue bookkeeping retry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warna_moto_core::{ProductId, Rupiah};

    #[test]
    fn test_checkout_body_with_missing_fields_still_deserializes() {
        // A missing field must reach the handler as None so it can answer
        // 400 with a message, instead of tripping the Json extractor's 422.
        let body: CreateTransactionRequest =
            serde_json::from_str(r#"{"courier": "jne", "courier_service": "REG"}"#).unwrap();

        assert!(body.address_id.is_none());
        assert_eq!(body.courier.as_deref(), Some("jne"));
    }

    #[test]
    fn test_required_field_rejects_missing_and_blank() {
        assert!(required_field(None, "courier").is_err());
        assert!(required_field(Some("  "), "courier").is_err());
        assert_eq!(required_field(Some(" jne "), "courier").unwrap(), "jne");
    }

    #[test]
    fn test_charge_items_sum_to_gross_amount() {
        let items = vec![
            NewOrderItem {
                product_id: ProductId::new(1),
                quantity: 2,
                unit_price: Rupiah::from_whole(150_000),
                product_name: "Cat Semprot Hitam Doff".to_owned(),
                product_sku: Some("WM-001".to_owned()),
                product_image: None,
            },
            NewOrderItem {
                product_id: ProductId::new(2),
                quantity: 1,
                unit_price: Rupiah::from_whole(5_000),
                product_name: "Amplas 400".to_owned(),
                product_sku: None,
                product_image: None,
            },
        ];

        let lines: Vec<PricedLine> = items
            .iter()
            .map(|i| PricedLine {
                unit_price: i.unit_price,
                quantity: i64::from(i.quantity),
            })
            .collect();
        let totals = CheckoutTotals::compute(
            &lines,
            Rupiah::from_whole(10_000),
            Rupiah::from_whole(2_000),
        );

        let charge = charge_items(&items, &totals);

        // Product lines plus the synthetic shipping and service-fee lines
        assert_eq!(charge.len(), 4);
        let line_sum: i64 = charge.iter().map(|c| c.price * c.quantity).sum();
        assert_eq!(line_sum, totals.total.to_gateway_units());
        assert_eq!(line_sum, 317_000);
    }
}
