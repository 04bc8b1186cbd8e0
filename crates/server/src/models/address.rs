//! Address book domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warna_moto_core::{AddressId, CustomerId};

/// A saved shipping address.
///
/// Exactly one address per customer may be primary; that invariant is
/// enforced by the remote `set_primary_address` procedure, not here.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    /// Customer-facing label ("Rumah", "Bengkel", ...).
    pub label: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub full_address: String,
    /// Aggregator city id used for shipping quotes.
    pub destination_city: String,
    /// Human-readable destination ("Kota Bandung, Jawa Barat").
    pub destination_text: String,
    pub postal_code: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or updating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub label: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub full_address: String,
    pub destination_city: String,
    pub destination_text: String,
    pub postal_code: String,
}

impl AddressInput {
    /// Check that no required field is blank.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            ("label", &self.label),
            ("recipient_name", &self.recipient_name),
            ("recipient_phone", &self.recipient_phone),
            ("full_address", &self.full_address),
            ("destination_city", &self.destination_city),
            ("destination_text", &self.destination_text),
            ("postal_code", &self.postal_code),
        ];
        fields
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            label: "Rumah".into(),
            recipient_name: "Budi Santoso".into(),
            recipient_phone: "081234567890".into(),
            full_address: "Jl. Merdeka No. 1".into(),
            destination_city: "501".into(),
            destination_text: "Kota Yogyakarta, DIY".into(),
            postal_code: "55111".into(),
        }
    }

    #[test]
    fn test_complete_input() {
        assert_eq!(input().missing_field(), None);
    }

    #[test]
    fn test_blank_field_detected() {
        let mut bad = input();
        bad.recipient_phone = "   ".into();
        assert_eq!(bad.missing_field(), Some("recipient_phone"));
    }
}
