//! Order and payment status state machines.
//!
//! Both enums are stored as snake_case text columns and mirror the statuses
//! the payment gateway reports. An order starts at `awaiting_payment` and is
//! only ever moved by the payment webhook; the finalizing stock/status work
//! happens in the remote `handle_successful_payment` procedure.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, gateway token issued, waiting for the customer
    /// to pay.
    AwaitingPayment,
    /// Funds captured; stock deduction has been triggered remotely.
    Settlement,
    /// Payment was cancelled, expired, or denied.
    Cancelled,
}

impl OrderStatus {
    /// The status string as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Settlement => "settlement",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the order has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Settlement | Self::Cancelled)
    }
}

/// Error parsing a status string from the database.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "settlement" => Ok(Self::Settlement),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a payment record, mirroring the gateway's transaction statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Token issued, no notification received yet.
    Pending,
    /// Funds captured.
    Settlement,
    /// Customer or gateway cancelled the transaction.
    Cancel,
    /// Payment window elapsed without payment.
    Expire,
    /// Gateway denied the payment (fraud or issuer rejection).
    Deny,
}

impl PaymentStatus {
    /// The status string as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settlement => "settlement",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
            Self::Deny => "deny",
        }
    }

    /// Whether the payment has reached a terminal state. Terminal payments
    /// are never updated again; this is the webhook's duplicate-delivery
    /// guard.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "settlement" => Ok(Self::Settlement),
            "cancel" => Ok(Self::Cancel),
            "expire" => Ok(Self::Expire),
            "deny" => Ok(Self::Deny),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::AwaitingPayment,
            OrderStatus::Settlement,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().expect("parse"), status);
        }
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(!OrderStatus::AwaitingPayment.is_terminal());
        assert!(OrderStatus::Settlement.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_payment_status_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Settlement.is_terminal());
        assert!(PaymentStatus::Expire.is_terminal());
    }

    #[test]
    fn test_unknown_status() {
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::AwaitingPayment).expect("serialize");
        assert_eq!(json, "\"awaiting_payment\"");
    }
}
