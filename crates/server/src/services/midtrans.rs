//! Midtrans Snap API client and webhook signature verification.
//!
//! The gateway identifies transactions by the store's order number, so the
//! order number is the join key between our `payments` table and webhook
//! notifications.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

use warna_moto_core::Rupiah;

use crate::config::MidtransConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum MidtransError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One charged line item sent to the gateway.
///
/// The gateway cross-checks that line items sum to `gross_amount`, so
/// shipping and the service fee are sent as synthetic lines.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeItem {
    pub id: String,
    /// Whole-rupiah price; the gateway rejects fractional IDR.
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

/// Details for creating a Snap transaction.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_number: String,
    pub gross_amount: Rupiah,
    pub items: Vec<ChargeItem>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

/// Response from creating a Snap transaction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: String,
}

/// Webhook notification payload from the gateway.
///
/// Fields not used for settlement handling are ignored on deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct MidtransNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_id: Option<String>,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
}

/// Midtrans Snap API client.
#[derive(Clone)]
pub struct MidtransClient {
    client: reqwest::Client,
    base_url: String,
    server_key: SecretString,
}

impl MidtransClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MidtransConfig) -> Result<Self, MidtransError> {
        // HTTP Basic with the server key as username and no password.
        let credentials = BASE64.encode(format!("{}:", config.server_key.expose_secret()));
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| MidtransError::Parse(format!("Invalid server key format: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", auth);
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            server_key: config.server_key.clone(),
        })
    }

    /// Create a Snap transaction and return its token and redirect URL.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response cannot be
    /// parsed.
    pub async fn create_snap_token(&self, charge: &ChargeRequest) -> Result<SnapToken, MidtransError> {
        let url = format!("{}/snap/v1/transactions", self.base_url);

        let body = serde_json::json!({
            "transaction_details": {
                "order_id": charge.order_number,
                "gross_amount": charge.gross_amount.to_gateway_units(),
            },
            "item_details": charge.items,
            "customer_details": {
                "first_name": charge.customer_name,
                "email": charge.customer_email,
                "phone": charge.customer_phone,
            },
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MidtransError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<SnapToken>()
            .await
            .map_err(|e| MidtransError::Parse(e.to_string()))
    }

    /// Verify a webhook notification's signature against our server key.
    #[must_use]
    pub fn verify_signature(&self, notification: &MidtransNotification) -> bool {
        let expected = signature_for(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            self.server_key.expose_secret(),
        );
        // Signatures are attacker-supplied hex; compare case-insensitively.
        expected.eq_ignore_ascii_case(&notification.signature_key)
    }
}

/// SHA-512 hex of `order_id + status_code + gross_amount + server_key`,
/// the gateway's documented signature formula.
fn signature_for(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());

    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(128), |mut out, b| {
            use std::fmt::Write as _;
            let _ = write!(out, "{b:02x}");
            out
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_client() -> MidtransClient {
        MidtransClient::new(&MidtransConfig {
            base_url: "https://app.sandbox.midtrans.com".to_string(),
            server_key: SecretString::from("SB-Mid-server-TESTKEY"),
        })
        .unwrap()
    }

    fn notification(signature_key: String) -> MidtransNotification {
        MidtransNotification {
            order_id: "WM-20250615-AB2C3".to_string(),
            status_code: "200".to_string(),
            gross_amount: "317000.00".to_string(),
            signature_key,
            transaction_id: Some("9aed5972-5b6a-401e-894b-a32c91ed1a3a".to_string()),
            transaction_status: "settlement".to_string(),
            fraud_status: Some("accept".to_string()),
            payment_type: Some("qris".to_string()),
        }
    }

    #[test]
    fn test_signature_verification_accepts_valid() {
        let client = test_client();
        let valid = signature_for(
            "WM-20250615-AB2C3",
            "200",
            "317000.00",
            "SB-Mid-server-TESTKEY",
        );
        assert!(client.verify_signature(&notification(valid)));
    }

    #[test]
    fn test_signature_verification_ignores_hex_case() {
        let client = test_client();
        let valid = signature_for(
            "WM-20250615-AB2C3",
            "200",
            "317000.00",
            "SB-Mid-server-TESTKEY",
        )
        .to_uppercase();
        assert!(client.verify_signature(&notification(valid)));
    }

    #[test]
    fn test_signature_verification_rejects_tampered() {
        let client = test_client();
        let valid = signature_for(
            "WM-20250615-AB2C3",
            "200",
            "999999.00",
            "SB-Mid-server-TESTKEY",
        );
        assert!(!client.verify_signature(&notification(valid)));
    }

    #[test]
    fn test_signature_is_sha512_hex() {
        let sig = signature_for("a", "b", "c", "d");
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_notification_parses_gateway_payload() {
        let json = r#"{
            "transaction_time": "2025-06-15 14:02:11",
            "transaction_status": "settlement",
            "transaction_id": "9aed5972-5b6a-401e-894b-a32c91ed1a3a",
            "status_message": "midtrans payment notification",
            "status_code": "200",
            "signature_key": "abc123",
            "payment_type": "qris",
            "order_id": "WM-20250615-AB2C3",
            "gross_amount": "317000.00",
            "fraud_status": "accept",
            "currency": "IDR"
        }"#;

        let parsed: MidtransNotification = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.order_id, "WM-20250615-AB2C3");
        assert_eq!(parsed.transaction_status, "settlement");
        assert_eq!(parsed.fraud_status.as_deref(), Some("accept"));
    }
}
