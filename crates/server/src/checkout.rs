//! Pure checkout arithmetic and the webhook state machine.
//!
//! Everything in this module is free of I/O so the order math can be tested
//! exhaustively: line totals, the final-total composition, order number
//! generation, and the mapping from gateway notification statuses to order
//! transitions.

use chrono::NaiveDate;
use rand::Rng;

use warna_moto_core::{OrderStatus, PaymentStatus, Rupiah};

/// Characters used for the random order-number suffix. Ambiguous glyphs
/// (0/O, 1/I) are excluded so support staff can read numbers back over the
/// phone.
const ORDER_SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of the random order-number suffix.
const ORDER_SUFFIX_LEN: usize = 5;

/// A cart line priced server-side against the current catalog.
#[derive(Debug, Clone)]
pub struct PricedLine {
    /// Unit price at order time.
    pub unit_price: Rupiah,
    /// Quantity ordered.
    pub quantity: i64,
}

impl PricedLine {
    /// The line total (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Rupiah {
        self.unit_price * self.quantity
    }
}

/// The totals snapshotted onto an order at creation time.
///
/// Invariant: `total = subtotal + shipping_cost + service_fee`, always. The
/// webhook never recomputes these; it only flips status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    /// Sum of all line totals.
    pub subtotal: Rupiah,
    /// Cost of the selected courier service.
    pub shipping_cost: Rupiah,
    /// Flat fee configured per store.
    pub service_fee: Rupiah,
    /// The amount charged through the gateway.
    pub total: Rupiah,
}

impl CheckoutTotals {
    /// Compute order totals from priced lines, a shipping quote, and the
    /// configured service fee.
    #[must_use]
    pub fn compute(lines: &[PricedLine], shipping_cost: Rupiah, service_fee: Rupiah) -> Self {
        let subtotal: Rupiah = lines.iter().map(PricedLine::line_total).sum();
        Self {
            subtotal,
            shipping_cost,
            service_fee,
            total: subtotal + shipping_cost + service_fee,
        }
    }
}

/// Generate a human-readable order number: `PREFIX-YYYYMMDD-XXXXX`.
///
/// The suffix is random, not sequential; uniqueness is ultimately enforced
/// by the unique index on `orders.order_number`.
pub fn generate_order_number<R: Rng>(prefix: &str, date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_SUFFIX_ALPHABET.len());
            char::from(ORDER_SUFFIX_ALPHABET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect();

    format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))
}

/// What the webhook should do with a notification, decided purely from the
/// gateway's `transaction_status` and `fraud_status` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    /// Funds captured and fraud-check accepted: finalize the order.
    Settle,
    /// Negative terminal outcome: cancel the order, record the payment
    /// status verbatim.
    Cancel(PaymentStatus),
    /// Intermediate or unrecognized status: acknowledge without touching
    /// state.
    Ignore,
}

impl WebhookAction {
    /// Map a gateway notification to an order transition.
    ///
    /// `settlement` (and `capture`, which card payments report) count as
    /// success only when the fraud check accepted. A missing `fraud_status`
    /// is treated as accepted; bank transfer notifications omit it.
    #[must_use]
    pub fn from_notification(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        let fraud_accepted = fraud_status.is_none_or(|f| f == "accept");
        match transaction_status {
            "settlement" | "capture" if fraud_accepted => Self::Settle,
            "cancel" => Self::Cancel(PaymentStatus::Cancel),
            "expire" => Self::Cancel(PaymentStatus::Expire),
            "deny" => Self::Cancel(PaymentStatus::Deny),
            // "capture" with a challenged/denied fraud status falls through
            // to deny; everything else (pending etc.) is ignored.
            "settlement" | "capture" => Self::Cancel(PaymentStatus::Deny),
            _ => Self::Ignore,
        }
    }

    /// The order status this action moves the order to, if any.
    #[must_use]
    pub const fn order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Settle => Some(OrderStatus::Settlement),
            Self::Cancel(_) => Some(OrderStatus::Cancelled),
            Self::Ignore => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn line(price: i64, qty: i64) -> PricedLine {
        PricedLine {
            unit_price: Rupiah::from_whole(price),
            quantity: qty,
        }
    }

    #[test]
    fn test_totals_compose_lines_shipping_and_fee() {
        // Two items (150000 x 2, 5000 x 1) + shipping 10000 + fee 2000
        let totals = CheckoutTotals::compute(
            &[line(150_000, 2), line(5_000, 1)],
            Rupiah::from_whole(10_000),
            Rupiah::from_whole(2_000),
        );

        assert_eq!(totals.subtotal, Rupiah::from_whole(305_000));
        assert_eq!(totals.total, Rupiah::from_whole(317_000));
    }

    #[test]
    fn test_totals_invariant_holds_for_empty_cart() {
        let totals =
            CheckoutTotals::compute(&[], Rupiah::from_whole(9_000), Rupiah::from_whole(2_000));
        assert_eq!(totals.subtotal, Rupiah::ZERO);
        assert_eq!(totals.total, totals.subtotal + totals.shipping_cost + totals.service_fee);
    }

    #[test]
    fn test_totals_zero_service_fee() {
        let totals = CheckoutTotals::compute(&[line(75_000, 1)], Rupiah::from_whole(10_000), Rupiah::ZERO);
        assert_eq!(totals.total, Rupiah::from_whole(85_000));
    }

    #[test]
    fn test_order_number_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        let number = generate_order_number("WM", date, &mut rng);

        let mut parts = number.split('-');
        assert_eq!(parts.next(), Some("WM"));
        assert_eq!(parts.next(), Some("20250314"));
        let suffix = parts.next().expect("suffix");
        assert_eq!(suffix.len(), 5);
        assert!(suffix.bytes().all(|b| ORDER_SUFFIX_ALPHABET.contains(&b)));
        assert_eq!(parts.next(), None);
    }

    #[test]
    fn test_order_numbers_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        let a = generate_order_number("WM", date, &mut rng);
        let b = generate_order_number("WM", date, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_webhook_settlement_accept() {
        assert_eq!(
            WebhookAction::from_notification("settlement", Some("accept")),
            WebhookAction::Settle
        );
        assert_eq!(
            WebhookAction::from_notification("capture", Some("accept")),
            WebhookAction::Settle
        );
    }

    #[test]
    fn test_webhook_missing_fraud_status_is_accept() {
        // Bank transfer settlements carry no fraud_status
        assert_eq!(
            WebhookAction::from_notification("settlement", None),
            WebhookAction::Settle
        );
    }

    #[test]
    fn test_webhook_fraud_challenge_denies() {
        assert_eq!(
            WebhookAction::from_notification("capture", Some("challenge")),
            WebhookAction::Cancel(PaymentStatus::Deny)
        );
    }

    #[test]
    fn test_webhook_negative_outcomes() {
        assert_eq!(
            WebhookAction::from_notification("cancel", None),
            WebhookAction::Cancel(PaymentStatus::Cancel)
        );
        assert_eq!(
            WebhookAction::from_notification("expire", None),
            WebhookAction::Cancel(PaymentStatus::Expire)
        );
        assert_eq!(
            WebhookAction::from_notification("deny", Some("deny")),
            WebhookAction::Cancel(PaymentStatus::Deny)
        );
    }

    #[test]
    fn test_webhook_pending_is_ignored() {
        assert_eq!(
            WebhookAction::from_notification("pending", None),
            WebhookAction::Ignore
        );
        assert_eq!(WebhookAction::from_notification("authorize", None), WebhookAction::Ignore);
    }

    #[test]
    fn test_order_status_mapping() {
        assert_eq!(
            WebhookAction::Settle.order_status(),
            Some(OrderStatus::Settlement)
        );
        assert_eq!(
            WebhookAction::Cancel(PaymentStatus::Expire).order_status(),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(WebhookAction::Ignore.order_status(), None);
    }
}
