//! Database operations for `cart_items`.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A cart line joined with the product it refers to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub product_id: i64,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
    pub stock: i32,
    pub quantity: i32,
}

impl CartItemRow {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Returns a user's cart lines, oldest addition first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cart_items(pool: &PgPool, user_id: i64) -> Result<Vec<CartItemRow>, DbError> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.product_id, p.name, p.image, p.price AS unit_price, p.stock, ci.quantity \
         FROM cart_items ci \
         JOIN products p ON p.id = ci.product_id \
         WHERE ci.user_id = $1 \
         ORDER BY ci.added_at, ci.product_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds `quantity` of a product, summing with any existing line.
///
/// # Errors
///
/// Returns [`DbError::MissingReference`] if the product does not exist, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn add_cart_item(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, quantity) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET \
             quantity = cart_items.quantity + EXCLUDED.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await
    .map_err(|e| {
        let e = DbError::from(e);
        if e.is_foreign_key_violation() {
            DbError::MissingReference("product")
        } else {
            e
        }
    })?;
    Ok(())
}

/// Sets the quantity of an existing line; a quantity below 1 removes it.
/// Returns `false` when the product is not in the cart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn set_cart_item_quantity(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<bool, DbError> {
    if quantity < 1 {
        return remove_cart_item(pool, user_id, product_id).await;
    }
    let result = sqlx::query(
        "UPDATE cart_items SET quantity = $3 \
         WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes one line. Returns `false` when the product was not in the cart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_cart_item(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Empties a user's cart and returns the number of lines removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_cart(pool: &PgPool, user_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
