//! Voucher repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use warna_moto_core::{CustomerId, Rupiah, VoucherId};

use super::RepositoryError;
use crate::models::voucher::{Voucher, VoucherClaim};

/// Database row for a voucher.
#[derive(sqlx::FromRow)]
struct VoucherRow {
    id: VoucherId,
    code: String,
    description: Option<String>,
    kind: String,
    value: Decimal,
    max_discount: Option<Rupiah>,
    min_subtotal: Rupiah,
    valid_until: Option<DateTime<Utc>>,
    is_active: bool,
}

impl VoucherRow {
    fn into_voucher(self) -> Result<Voucher, RepositoryError> {
        let kind = self.kind.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid voucher kind in database: {e}"))
        })?;

        Ok(Voucher {
            id: self.id,
            code: self.code,
            description: self.description,
            kind,
            value: self.value,
            max_discount: self.max_discount,
            min_subtotal: self.min_subtotal,
            valid_until: self.valid_until,
            is_active: self.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    voucher_id: VoucherId,
    customer_id: CustomerId,
    claimed_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl From<ClaimRow> for VoucherClaim {
    fn from(row: ClaimRow) -> Self {
        Self {
            voucher_id: row.voucher_id,
            customer_id: row.customer_id,
            claimed_at: row.claimed_at,
            used_at: row.used_at,
        }
    }
}

const VOUCHER_COLUMNS: &str =
    "id, code, description, kind, value, max_discount, min_subtotal, valid_until, is_active";

/// Repository for voucher database operations.
pub struct VoucherRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VoucherRepository<'a> {
    /// Create a new voucher repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List vouchers that are active and not yet expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(&self) -> Result<Vec<Voucher>, RepositoryError> {
        let rows = sqlx::query_as::<_, VoucherRow>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM store.vouchers \
             WHERE is_active AND (valid_until IS NULL OR valid_until > now()) \
             ORDER BY code ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(VoucherRow::into_voucher).collect()
    }

    /// Look up a voucher by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError> {
        let row = sqlx::query_as::<_, VoucherRow>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM store.vouchers WHERE upper(code) = upper($1)"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(VoucherRow::into_voucher).transpose()
    }

    /// Claim a voucher for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer already claimed
    /// this voucher.
    pub async fn claim(
        &self,
        voucher_id: VoucherId,
        customer_id: CustomerId,
    ) -> Result<VoucherClaim, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r"
            INSERT INTO store.customer_vouchers (voucher_id, customer_id)
            VALUES ($1, $2)
            RETURNING voucher_id, customer_id, claimed_at, used_at
            ",
        )
        .bind(voucher_id)
        .bind(customer_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("voucher already claimed".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Get a customer's claim on a voucher, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_claim(
        &self,
        voucher_id: VoucherId,
        customer_id: CustomerId,
    ) -> Result<Option<VoucherClaim>, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r"
            SELECT voucher_id, customer_id, claimed_at, used_at
            FROM store.customer_vouchers
            WHERE voucher_id = $1 AND customer_id = $2
            ",
        )
        .bind(voucher_id)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(VoucherClaim::from))
    }

    /// List the vouchers a customer has claimed, with claim state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_claimed(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<(Voucher, VoucherClaim)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct ClaimedRow {
            #[sqlx(flatten)]
            voucher: VoucherRow,
            claimed_at: DateTime<Utc>,
            used_at: Option<DateTime<Utc>>,
        }

        let rows = sqlx::query_as::<_, ClaimedRow>(&format!(
            "SELECT v.{}, cv.claimed_at, cv.used_at \
             FROM store.customer_vouchers cv \
             JOIN store.vouchers v ON v.id = cv.voucher_id \
             WHERE cv.customer_id = $1 \
             ORDER BY cv.claimed_at DESC",
            VOUCHER_COLUMNS.replace(", ", ", v.")
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let claim = VoucherClaim {
                    voucher_id: row.voucher.id,
                    customer_id,
                    claimed_at: row.claimed_at,
                    used_at: row.used_at,
                };
                Ok((row.voucher.into_voucher()?, claim))
            })
            .collect()
    }
}
