//! Rupiah money type backed by decimal arithmetic.
//!
//! All storefront amounts (prices, shipping costs, order totals, voucher
//! discounts) are Indonesian rupiah. Rupiah has no fractional unit in retail
//! use, but the payment gateway reports gross amounts with a decimal point
//! (e.g. `"317000.00"`), so the type wraps [`rust_decimal::Decimal`] rather
//! than a bare integer.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// An amount of Indonesian rupiah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rupiah(Decimal);

impl Rupiah {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole rupiah.
    #[must_use]
    pub fn from_whole(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Format for the payment gateway, which expects gross amounts as
    /// integers (rupiah has no sub-unit the gateway accepts).
    #[must_use]
    pub fn to_gateway_units(&self) -> i64 {
        self.0.round().to_i64().unwrap_or(0)
    }
}

impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Rupiah {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Rupiah {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, qty: i64) -> Self {
        Self(self.0 * Decimal::from(qty))
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rp{}", self.0.round())
    }
}

impl FromStr for Rupiah {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

impl From<Decimal> for Rupiah {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Rupiah> for Decimal {
    fn from(amount: Rupiah) -> Self {
        amount.0
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Rupiah {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Rupiah {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Rupiah {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let subtotal = Rupiah::from_whole(100_000) * 2 + Rupiah::from_whole(50_000);
        assert_eq!(subtotal, Rupiah::from_whole(250_000));
        assert_eq!(
            subtotal - Rupiah::from_whole(50_000),
            Rupiah::from_whole(200_000)
        );
    }

    #[test]
    fn test_sum() {
        let total: Rupiah = [10_000, 2_500, 500]
            .into_iter()
            .map(Rupiah::from_whole)
            .sum();
        assert_eq!(total, Rupiah::from_whole(13_000));
    }

    #[test]
    fn test_parse_gateway_gross_amount() {
        // The gateway reports "317000.00" style amounts
        let amount: Rupiah = "317000.00".parse().expect("parse");
        assert_eq!(amount, Rupiah::from_whole(317_000));
        assert_eq!(amount.to_gateway_units(), 317_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rupiah::from_whole(15_000).to_string(), "Rp15000");
    }

    #[test]
    fn test_serde_transparent() {
        let amount = Rupiah::from_whole(2_000);
        let json = serde_json::to_string(&amount).expect("serialize");
        let back: Rupiah = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, amount);
    }
}
