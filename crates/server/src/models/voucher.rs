//! Voucher domain types and discount math.
//!
//! Vouchers are claimed into a per-customer join table and validated at
//! apply time. The discount computation is pure so it can be tested without
//! a database.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use warna_moto_core::{CustomerId, Rupiah, VoucherId};

/// How a voucher's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// `value` is a percentage of the subtotal, optionally capped.
    Percent,
    /// `value` is a fixed rupiah amount.
    Fixed,
}

impl VoucherKind {
    /// The kind string as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }
}

/// Error parsing a voucher kind from the database.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown voucher kind: {0}")]
pub struct UnknownVoucherKind(String);

impl FromStr for VoucherKind {
    type Err = UnknownVoucherKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Self::Percent),
            "fixed" => Ok(Self::Fixed),
            other => Err(UnknownVoucherKind(other.to_owned())),
        }
    }
}

/// A voucher definition.
#[derive(Debug, Clone, Serialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub description: Option<String>,
    pub kind: VoucherKind,
    /// Percentage (e.g. `10`) for percent vouchers, rupiah for fixed ones.
    pub value: Decimal,
    /// Cap on the discount for percent vouchers.
    pub max_discount: Option<Rupiah>,
    /// Minimum cart subtotal required to apply.
    pub min_subtotal: Rupiah,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// A customer's claim on a voucher.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherClaim {
    pub voucher_id: VoucherId,
    pub customer_id: CustomerId,
    pub claimed_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Why a voucher cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoucherRejection {
    #[error("voucher is no longer active")]
    Inactive,
    #[error("voucher has expired")]
    Expired,
    #[error("cart subtotal is below the minimum of {0}")]
    BelowMinimum(Rupiah),
    #[error("voucher has already been used")]
    AlreadyUsed,
}

impl Voucher {
    /// Validate a claim against a cart subtotal and compute the discount.
    ///
    /// # Errors
    ///
    /// Returns a [`VoucherRejection`] when the voucher is inactive, expired,
    /// already used, or the subtotal is below the voucher's minimum.
    pub fn apply(
        &self,
        claim: &VoucherClaim,
        subtotal: Rupiah,
        now: DateTime<Utc>,
    ) -> Result<Rupiah, VoucherRejection> {
        if !self.is_active {
            return Err(VoucherRejection::Inactive);
        }
        if claim.used_at.is_some() {
            return Err(VoucherRejection::AlreadyUsed);
        }
        if let Some(valid_until) = self.valid_until
            && now > valid_until
        {
            return Err(VoucherRejection::Expired);
        }
        if subtotal < self.min_subtotal {
            return Err(VoucherRejection::BelowMinimum(self.min_subtotal));
        }

        Ok(self.discount_for(subtotal))
    }

    /// The discount amount for a subtotal. Never exceeds the subtotal.
    fn discount_for(&self, subtotal: Rupiah) -> Rupiah {
        let raw = match self.kind {
            VoucherKind::Percent => {
                let fraction = self.value / Decimal::from(100);
                let discount = Rupiah::new((subtotal.amount() * fraction).round());
                match self.max_discount {
                    Some(cap) if discount > cap => cap,
                    _ => discount,
                }
            }
            VoucherKind::Fixed => Rupiah::new(self.value),
        };

        if raw > subtotal { subtotal } else { raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn voucher(kind: VoucherKind, value: i64) -> Voucher {
        Voucher {
            id: VoucherId::new(1),
            code: "HEMAT10".into(),
            description: None,
            kind,
            value: Decimal::from(value),
            max_discount: None,
            min_subtotal: Rupiah::from_whole(50_000),
            valid_until: Some(Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).single().expect("valid")),
            is_active: true,
        }
    }

    fn claim() -> VoucherClaim {
        VoucherClaim {
            voucher_id: VoucherId::new(1),
            customer_id: CustomerId::new(1),
            claimed_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().expect("valid"),
            used_at: None,
        }
    }

    fn june() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().expect("valid")
    }

    #[test]
    fn test_percent_discount() {
        let v = voucher(VoucherKind::Percent, 10);
        let discount = v.apply(&claim(), Rupiah::from_whole(200_000), june()).expect("apply");
        assert_eq!(discount, Rupiah::from_whole(20_000));
    }

    #[test]
    fn test_percent_discount_capped() {
        let mut v = voucher(VoucherKind::Percent, 10);
        v.max_discount = Some(Rupiah::from_whole(15_000));
        let discount = v.apply(&claim(), Rupiah::from_whole(200_000), june()).expect("apply");
        assert_eq!(discount, Rupiah::from_whole(15_000));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let v = voucher(VoucherKind::Fixed, 100_000);
        let discount = v.apply(&claim(), Rupiah::from_whole(60_000), june()).expect("apply");
        assert_eq!(discount, Rupiah::from_whole(60_000));
    }

    #[test]
    fn test_below_minimum_rejected() {
        let v = voucher(VoucherKind::Fixed, 5_000);
        assert_eq!(
            v.apply(&claim(), Rupiah::from_whole(10_000), june()),
            Err(VoucherRejection::BelowMinimum(Rupiah::from_whole(50_000)))
        );
    }

    #[test]
    fn test_expired_rejected() {
        let v = voucher(VoucherKind::Percent, 10);
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid");
        assert_eq!(
            v.apply(&claim(), Rupiah::from_whole(100_000), later),
            Err(VoucherRejection::Expired)
        );
    }

    #[test]
    fn test_used_rejected() {
        let v = voucher(VoucherKind::Percent, 10);
        let mut used = claim();
        used.used_at = Some(june());
        assert_eq!(
            v.apply(&used, Rupiah::from_whole(100_000), june()),
            Err(VoucherRejection::AlreadyUsed)
        );
    }

    #[test]
    fn test_inactive_rejected() {
        let mut v = voucher(VoucherKind::Percent, 10);
        v.is_active = false;
        assert_eq!(
            v.apply(&claim(), Rupiah::from_whole(100_000), june()),
            Err(VoucherRejection::Inactive)
        );
    }

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!("percent".parse::<VoucherKind>().expect("parse"), VoucherKind::Percent);
        assert_eq!(VoucherKind::Fixed.as_str(), "fixed");
        assert!("bogus".parse::<VoucherKind>().is_err());
    }
}
