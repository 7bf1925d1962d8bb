//! Read-model queries for the admin dashboard and sales analytics.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{DbError, OrderWithCustomerRow};

/// Headline store counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DashboardSummaryRow {
    /// Sum of `total_amount` over paid orders.
    pub total_sales: Decimal,
    pub total_orders: i64,
    pub total_products: i64,
    pub total_customers: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LowStockRow {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub stock: i32,
}

/// Paid sales for one UTC day.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailySalesRow {
    /// `YYYY-MM-DD`.
    pub day: String,
    pub total_sales: Decimal,
    pub order_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProductRow {
    pub product_id: i64,
    /// `None` once the product has been deleted.
    pub name: Option<String>,
    pub image: Option<String>,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn dashboard_summary(pool: &PgPool) -> Result<DashboardSummaryRow, DbError> {
    let row = sqlx::query_as::<_, DashboardSummaryRow>(
        "SELECT \
             (SELECT COALESCE(SUM(total_amount), 0) FROM orders \
               WHERE payment_status = 'paid') AS total_sales, \
             (SELECT COUNT(*) FROM orders) AS total_orders, \
             (SELECT COUNT(*) FROM products) AS total_products, \
             (SELECT COUNT(*) FROM users WHERE role = 'customer') AS total_customers",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the `limit` most recent orders with account details.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_orders(pool: &PgPool, limit: i64) -> Result<Vec<OrderWithCustomerRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderWithCustomerRow>(
        "SELECT o.id, o.user_id, o.total_amount, o.status, o.payment_status, \
                o.payment_method, o.customer_name, o.customer_email, o.customer_phone, \
                o.shipping_address, o.created_at, o.updated_at, \
                u.name AS account_name, u.email AS account_email \
         FROM orders o JOIN users u ON u.id = o.user_id \
         ORDER BY o.created_at DESC, o.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` products whose stock is below `threshold`, lowest
/// stock first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn low_stock_products(
    pool: &PgPool,
    threshold: i32,
    limit: i64,
) -> Result<Vec<LowStockRow>, DbError> {
    let rows = sqlx::query_as::<_, LowStockRow>(
        "SELECT id, name, image, stock FROM products \
         WHERE stock < $1 \
         ORDER BY stock, id \
         LIMIT $2",
    )
    .bind(threshold)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Paid sales grouped by UTC day over the last `days` days, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn daily_sales(pool: &PgPool, days: i32) -> Result<Vec<DailySalesRow>, DbError> {
    let rows = sqlx::query_as::<_, DailySalesRow>(
        "SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day, \
                SUM(total_amount) AS total_sales, \
                COUNT(*) AS order_count \
         FROM orders \
         WHERE payment_status = 'paid' \
           AND created_at >= NOW() - make_interval(days => $1) \
         GROUP BY day \
         ORDER BY day",
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Best-selling products by quantity across all paid orders.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_products(pool: &PgPool, limit: i64) -> Result<Vec<TopProductRow>, DbError> {
    let rows = sqlx::query_as::<_, TopProductRow>(
        "SELECT oi.product_id, p.name, p.image, \
                SUM(oi.quantity)::BIGINT AS total_quantity, \
                SUM(oi.quantity * oi.price) AS total_revenue \
         FROM order_items oi \
         JOIN orders o ON o.id = oi.order_id \
         LEFT JOIN products p ON p.id = oi.product_id \
         WHERE o.payment_status = 'paid' AND oi.product_id IS NOT NULL \
         GROUP BY oi.product_id, p.name, p.image \
         ORDER BY total_quantity DESC, oi.product_id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
