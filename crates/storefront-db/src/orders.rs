//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use storefront_core::{Address, OrderLine, OrderStatus, PaymentStatus};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: Decimal,
    /// Always lower-case; one of [`OrderStatus`].
    pub status: String,
    /// Always lower-case; one of [`PaymentStatus`].
    pub payment_status: String,
    pub payment_method: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Json<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order plus the name and email of the account that placed it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderWithCustomerRow {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub account_name: String,
    pub account_email: String,
}

/// A row from `order_items` with the product's current name and image.
/// Both are `None` once the product has been deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: i64,
    pub lines: &'a [OrderLine],
    pub total_amount: f64,
    pub shipping_address: &'a Address,
    pub payment_method: &'a str,
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
}

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.total_amount, o.status, o.payment_status, \
     o.payment_method, o.customer_name, o.customer_email, o.customer_phone, \
     o.shipping_address, o.created_at, o.updated_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts an order with its items and empties the customer's cart, all in
/// one transaction.
///
/// # Errors
///
/// Returns [`DbError::MissingReference`] if an item names an unknown
/// product, or [`DbError::Sqlx`] if any statement fails.
pub async fn create_order(pool: &PgPool, order: &NewOrder<'_>) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders AS o \
             (user_id, total_amount, payment_method, customer_name, customer_email, \
              customer_phone, shipping_address) \
         VALUES ($1, $2::numeric(12,2), $3, $4, $5, $6, $7) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(order.payment_method)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(Json(order.shipping_address))
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i64> = order.lines.iter().map(|l| l.product_id).collect();
    let quantities: Vec<i32> = order.lines.iter().map(|l| l.quantity).collect();
    let prices: Vec<f64> = order.lines.iter().map(|l| l.price).collect();

    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, price) \
         SELECT $1, item.product_id, item.quantity, item.price::numeric(10,2) \
         FROM UNNEST($2::BIGINT[], $3::INT[], $4::FLOAT8[]) \
              AS item(product_id, quantity, price)",
    )
    .bind(row.id)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&prices)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        let e = DbError::from(e);
        if e.is_foreign_key_violation() {
            DbError::MissingReference("product")
        } else {
            e
        }
    })?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(order.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_id = row.id, user_id = order.user_id, "order created");
    Ok(row)
}

/// Sets status and/or payment status and returns the updated order with its
/// account details. Returns `None` when no order has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_order_status(
    pool: &PgPool,
    id: i64,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> Result<Option<OrderWithCustomerRow>, DbError> {
    let row = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
        "WITH o AS ( \
             UPDATE orders SET \
                 status         = COALESCE($2, status), \
                 payment_status = COALESCE($3, payment_status), \
                 updated_at     = NOW() \
             WHERE id = $1 \
             RETURNING * \
         ) \
         SELECT {ORDER_COLUMNS}, u.name AS account_name, u.email AS account_email \
         FROM o JOIN users u ON u.id = o.user_id"
    ))
    .bind(id)
    .bind(status.map(OrderStatus::as_str))
    .bind(payment_status.map(PaymentStatus::as_str))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_with_customer(
    pool: &PgPool,
    id: i64,
) -> Result<Option<OrderWithCustomerRow>, DbError> {
    let row = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
        "SELECT {ORDER_COLUMNS}, u.name AS account_name, u.email AS account_email \
         FROM orders o JOIN users u ON u.id = o.user_id \
         WHERE o.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a user's orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders o \
         WHERE o.user_id = $1 \
         ORDER BY o.created_at DESC, o.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every order with account details, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_orders(pool: &PgPool) -> Result<Vec<OrderWithCustomerRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
        "SELECT {ORDER_COLUMNS}, u.name AS account_name, u.email AS account_email \
         FROM orders o JOIN users u ON u.id = o.user_id \
         ORDER BY o.created_at DESC, o.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the items of every listed order, grouped by order id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, \
                p.image AS product_image, oi.quantity, oi.price \
         FROM order_items oi \
         LEFT JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = ANY($1) \
         ORDER BY oi.order_id, oi.id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
