//! Database operations for `coupons`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `coupons` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CouponRow {
    pub id: i64,
    /// Upper-cased, trimmed.
    pub code: String,
    /// Percentage off, 1–100.
    pub discount: i32,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

const COUPON_COLUMNS: &str = "id, code, discount, expiry_date, is_active, created_at";

/// Returns every coupon, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_coupons(pool: &PgPool) -> Result<Vec<CouponRow>, DbError> {
    let rows = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a coupon. `code` must already be normalized.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation on `code`.
pub async fn create_coupon(
    pool: &PgPool,
    code: &str,
    discount: i32,
    expiry_date: DateTime<Utc>,
) -> Result<CouponRow, DbError> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "INSERT INTO coupons (code, discount, expiry_date) \
         VALUES ($1, $2, $3) \
         RETURNING {COUPON_COLUMNS}"
    ))
    .bind(code)
    .bind(discount)
    .bind(expiry_date)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes a coupon. Returns `false` when no coupon has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_coupon(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Finds an active coupon by normalized code. Expiry is not checked here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_active_coupon(pool: &PgPool, code: &str) -> Result<Option<CouponRow>, DbError> {
    let row = sqlx::query_as::<_, CouponRow>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1 AND is_active"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
